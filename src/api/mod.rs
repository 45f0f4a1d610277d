//! Web API module for Plantworks
//!
//! - `GET  /health`   - liveness and version
//! - `POST /sessions` - create a conversation session
//! - `POST /run`      - run one turn through the coordinator
//! - `POST /api/plant_rag` - catalogue passages for a question

pub mod health;
pub mod plant_rag;
pub mod run;
pub mod sessions;

#[cfg(test)]
mod tests;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json, Router};
use plantworks_core::{Coordinator, CoordinatorError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use health::health_routes;
pub use plant_rag::plant_rag_routes;
pub use run::run_routes;
pub use sessions::sessions_routes;

/// State shared by every handler
#[derive(Clone)]
pub struct ApiState {
    pub coordinator: Arc<Coordinator>,
    /// App name used when a request does not name one
    pub app_name: Arc<str>,
    pub turn_timeout: Duration,
}

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// A coordinator error rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub CoordinatorError);

impl From<CoordinatorError> for ApiError {
    fn from(err: CoordinatorError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            CoordinatorError::EmptyOrUnroutable => StatusCode::UNPROCESSABLE_ENTITY,
            CoordinatorError::Cancelled => StatusCode::REQUEST_TIMEOUT,
            CoordinatorError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        (status, Json(ApiResponse::<()>::error(self.0.to_string()))).into_response()
    }
}

/// Create the full router: every endpoint plus tracing and CORS layers
pub fn router(coordinator: Arc<Coordinator>, app_name: &str, turn_timeout: Duration) -> Router {
    let state = ApiState {
        coordinator,
        app_name: Arc::from(app_name),
        turn_timeout,
    };

    Router::new()
        .merge(health_routes())
        .merge(sessions_routes())
        .merge(run_routes())
        .merge(plant_rag_routes())
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
