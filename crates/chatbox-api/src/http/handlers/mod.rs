//! HTTP request handlers for the REST API.

pub mod chat;
pub mod persona;
pub mod user;
pub mod voice;

use uuid::Uuid;

use chatbox_types::error::ChatError;

use crate::http::error::AppError;

/// Parse a session id path segment. A malformed id names no session.
pub(crate) fn parse_session_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Chat(ChatError::SessionNotFound))
}
