//! Per-user session listing.

use axum::extract::{Path, State};
use axum::Json;

use chatbox_types::chat::SessionSummary;

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// GET /api/users/{user_id}/sessions - Named sessions, most recent first.
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<SessionSummary>>>, AppError> {
    let timer = RequestTimer::start();
    let sessions = state.chat_service.list_user_sessions(user_id).await?;
    Ok(Json(timer.finish(sessions)))
}
