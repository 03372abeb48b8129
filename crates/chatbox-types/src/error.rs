use thiserror::Error;

/// Errors related to chat sessions and message turns.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat session not found")]
    SessionNotFound,

    #[error("persona {0} not found")]
    PersonaNotFound(i64),

    #[error("message must not be empty")]
    EmptyMessage,

    /// The requested model version is unknown to the provider.
    #[error("invalid model version '{0}'")]
    InvalidModel(String),

    /// The provider rejected the request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The model provider could not be reached or failed.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("persistence error: {0}")]
    Persistence(String),
}

/// Errors related to persona operations.
#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("persona not found")]
    NotFound,

    #[error("persona with role_name '{0}' already exists")]
    Conflict(String),

    #[error("persona is referenced by {0} session(s)")]
    InUse(u64),

    #[error("invalid persona: {0}")]
    Invalid(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors from repository operations (used by trait definitions in chatbox-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::InvalidModel("gemini-0".to_string());
        assert_eq!(err.to_string(), "invalid model version 'gemini-0'");
    }

    #[test]
    fn test_persona_error_display() {
        let err = PersonaError::Conflict("Barista".to_string());
        assert_eq!(err.to_string(), "persona with role_name 'Barista' already exists");
        assert_eq!(PersonaError::InUse(2).to_string(), "persona is referenced by 2 session(s)");
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }
}
