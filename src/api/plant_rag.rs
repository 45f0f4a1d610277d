//! Plant knowledge retrieval
//!
//! POST /api/plant_rag - catalogue passages relevant to a question, without
//! running a turn.

use super::ApiResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::post, Json, Router};
use plantworks_tools::{retrieve_plants, PlantPassage};
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_TOP_K: usize = 3;
const MAX_TOP_K: usize = 10;

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

/// Retrieval request
#[derive(Debug, Deserialize)]
pub struct PlantRagRequest {
    pub question: String,
    /// Passages to return, capped at 10
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

/// Retrieved passages, best first
#[derive(Debug, Serialize)]
pub struct PlantRagResponse {
    pub answers: Vec<PlantPassage>,
}

async fn plant_rag(Json(request): Json<PlantRagRequest>) -> Response {
    let question = request.question.trim();
    if question.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::<()>::error("question must not be empty")),
        )
            .into_response();
    }

    let top_k = request.top_k.clamp(1, MAX_TOP_K);
    let answers = retrieve_plants(question, top_k);
    debug!(top_k, found = answers.len(), "Plant retrieval");

    Json(ApiResponse::success(PlantRagResponse { answers })).into_response()
}

/// Retrieval routes
pub fn plant_rag_routes() -> Router {
    Router::new().route("/api/plant_rag", post(plant_rag))
}
