//! Voice catalogue handler.

use axum::extract::State;
use axum::Json;

use chatbox_core::audio::speech::{SpeechSynthesizer, english_voices};
use chatbox_types::audio::Voice;

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// GET /api/voices - English voices sorted by language, then name.
pub async fn list_voices(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Voice>>>, AppError> {
    let timer = RequestTimer::start();
    let speech = state
        .speech
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("speech provider is not configured".to_string()))?;

    let voices = speech
        .list_voices()
        .await
        .map_err(|e| AppError::Unavailable(e.to_string()))?;

    Ok(Json(timer.finish(english_voices(voices))))
}
