//! Sessions API endpoint
//!
//! POST /sessions - Create a session (idempotent)

use super::{ApiError, ApiResponse, ApiState};
use axum::{extract::Extension, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to create a session
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Defaults to the configured app name
    #[serde(default)]
    pub app_name: Option<String>,
    pub user_id: String,
    /// Generated when absent
    #[serde(default)]
    pub session_id: Option<String>,
}

/// The created session's key
#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

async fn create_session(
    Extension(state): Extension<ApiState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionCreated>>), ApiError> {
    let app_name = request
        .app_name
        .unwrap_or_else(|| state.app_name.to_string());
    let session_id = request
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    state
        .coordinator
        .create_session(&app_name, &request.user_id, &session_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(SessionCreated {
            app_name,
            user_id: request.user_id,
            session_id,
        })),
    ))
}

/// Session routes
pub fn sessions_routes() -> Router {
    Router::new().route("/sessions", post(create_session))
}
