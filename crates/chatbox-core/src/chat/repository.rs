//! ChatRepository trait definition.
//!
//! Sessions own their history as one JSON document, so a turn is committed as
//! a single read-modify-write of that document.

use chatbox_types::chat::{ChatSession, SessionSummary, TurnCommit};
use chatbox_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for chat session persistence.
///
/// Implementations live in chatbox-infra (e.g., `SqliteChatRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatRepository: Send + Sync {
    /// Create a new chat session.
    fn create_session(
        &self,
        session: &ChatSession,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// Get a chat session by its unique ID.
    fn get_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// List a user's named sessions, most recently updated first.
    ///
    /// Sessions that never received a message have no display name and are
    /// left out.
    fn list_user_sessions(
        &self,
        owner_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<SessionSummary>, RepositoryError>> + Send;

    /// Append one completed turn to the stored history.
    ///
    /// Must run as one transaction: re-read the stored history, append both
    /// messages, set the display name from the user message if the stored
    /// history was empty and no name exists yet, apply the persona and model
    /// references when given, bump `updated_at`. Returns the session as
    /// committed, or `RepositoryError::NotFound` if it no longer exists.
    fn commit_turn(
        &self,
        session_id: &Uuid,
        turn: &TurnCommit,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;
}
