//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use chatbox_types::error::{ChatError, PersonaError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Chat session and message-turn errors.
    Chat(ChatError),
    /// Persona errors.
    Persona(PersonaError),
    /// Malformed path or body.
    Validation(String),
    /// A backing service is not configured or not reachable.
    Unavailable(String),
    /// Generic internal error.
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<PersonaError> for AppError {
    fn from(e: PersonaError) -> Self {
        AppError::Persona(e)
    }
}

impl AppError {
    /// Status, machine-readable code and message for this error.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Chat(e @ ChatError::SessionNotFound) => {
                (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND", e.to_string())
            }
            AppError::Chat(e @ ChatError::PersonaNotFound(_)) => {
                (StatusCode::NOT_FOUND, "PERSONA_NOT_FOUND", e.to_string())
            }
            AppError::Chat(e @ ChatError::EmptyMessage) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::Chat(e @ ChatError::InvalidModel(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_MODEL", e.to_string())
            }
            AppError::Chat(e @ ChatError::InvalidRequest(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::Chat(e @ ChatError::UpstreamUnavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "UPSTREAM_UNAVAILABLE", e.to_string())
            }
            AppError::Chat(e @ ChatError::Persistence(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR", e.to_string())
            }
            AppError::Persona(e @ PersonaError::NotFound) => {
                (StatusCode::NOT_FOUND, "PERSONA_NOT_FOUND", e.to_string())
            }
            AppError::Persona(e @ PersonaError::Conflict(_)) => {
                (StatusCode::CONFLICT, "PERSONA_CONFLICT", e.to_string())
            }
            AppError::Persona(e @ PersonaError::InUse(_)) => {
                (StatusCode::CONFLICT, "PERSONA_IN_USE", e.to_string())
            }
            AppError::Persona(e @ PersonaError::Invalid(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::Persona(e @ PersonaError::StorageError(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSONA_ERROR", e.to_string())
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "UPSTREAM_UNAVAILABLE", msg.clone())
            }
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::warn!(%status, code, %message, "request failed");
        }

        let envelope = ApiResponse::error(code, &message, uuid::Uuid::now_v7().to_string(), 0);
        (status, envelope).into_response()
    }
}
