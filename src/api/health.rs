//! Health check endpoint

use super::ApiState;
use axum::extract::Extension;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Name of the coordinator serving turns
    pub coordinator: String,
    pub version: &'static str,
}

async fn health_check(Extension(state): Extension<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        coordinator: state.coordinator.name().to_string(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Health routes
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_check))
}
