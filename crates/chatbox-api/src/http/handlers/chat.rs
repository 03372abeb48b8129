//! Chat session handlers: start, fetch, and send a message.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::Json;

use chatbox_types::chat::{ChatSession, SendMessageRequest, StartSessionRequest};

use super::parse_session_id;
use crate::http::error::AppError;
use crate::http::extract::ApiJson;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// Response header carrying the model version that produced the reply.
pub const BOT_VERSION_HEADER: HeaderName = HeaderName::from_static("x-bot-version");

/// POST /api/chat/start - Open a new session.
pub async fn start_session(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<StartSessionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ChatSession>>), AppError> {
    let timer = RequestTimer::start();
    let session = state.chat_service.start_session(body).await?;
    Ok((StatusCode::CREATED, Json(timer.finish(session))))
}

/// GET /api/chat/{session_id} - Fetch a session with its full history.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<ChatSession>>, AppError> {
    let timer = RequestTimer::start();
    let session_id = parse_session_id(&session_id)?;
    let session = state.chat_service.get_session(&session_id).await?;
    Ok(Json(timer.finish(session)))
}

/// POST /api/chat/{session_id}/message - Run one message turn.
///
/// Returns the committed session; `x-bot-version` names the model used.
pub async fn send_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    ApiJson(body): ApiJson<SendMessageRequest>,
) -> Result<(HeaderMap, Json<ApiResponse<ChatSession>>), AppError> {
    let timer = RequestTimer::start();
    let session_id = parse_session_id(&session_id)?;

    let outcome = state.chat_service.send_message(&session_id, body).await?;

    let mut headers = HeaderMap::new();
    let version = HeaderValue::from_str(&outcome.model_version)
        .map_err(|e| AppError::Internal(format!("model version is not a valid header: {e}")))?;
    headers.insert(BOT_VERSION_HEADER, version);

    Ok((headers, Json(timer.finish(outcome.session))))
}
