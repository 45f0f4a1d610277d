//! Turn API endpoint
//!
//! POST /run - Run one turn; the turn is cancelled once the configured
//! turn timeout elapses.

use super::{ApiError, ApiResponse, ApiState};
use axum::{extract::Extension, routing::post, Json, Router};
use plantworks_core::{NewMessage, TurnResponse};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Request to run a turn
///
/// Either `new_message` or the `text` shorthand carries the query.
#[derive(Debug, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub app_name: Option<String>,
    pub user_id: String,
    pub session_id: String,
    #[serde(default, alias = "message")]
    pub new_message: Option<NewMessage>,
    #[serde(default)]
    pub text: Option<String>,
}

impl RunRequest {
    fn message(&mut self) -> NewMessage {
        self.new_message
            .take()
            .unwrap_or_else(|| NewMessage::user(self.text.take().unwrap_or_default()))
    }
}

async fn run_turn(
    Extension(state): Extension<ApiState>,
    Json(mut request): Json<RunRequest>,
) -> Result<Json<ApiResponse<TurnResponse>>, ApiError> {
    let message = request.message();
    let app_name = request
        .app_name
        .take()
        .unwrap_or_else(|| state.app_name.to_string());

    let cancel = CancellationToken::new();
    let deadline = {
        let cancel = cancel.clone();
        let limit = state.turn_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            debug!(?limit, "Turn timeout elapsed");
            cancel.cancel();
        })
    };

    let result = state
        .coordinator
        .run_with_cancellation(&app_name, &request.user_id, &request.session_id, message, cancel)
        .await;
    deadline.abort();

    Ok(Json(ApiResponse::success(result?)))
}

/// Turn routes
pub fn run_routes() -> Router {
    Router::new().route("/run", post(run_turn))
}
