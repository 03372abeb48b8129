//! PersonaRepository trait definition.

use chatbox_types::error::RepositoryError;
use chatbox_types::persona::{Persona, PersonaDraft};

/// Repository trait for persona persistence.
///
/// `role_name` is unique; writes that would duplicate it fail with
/// `RepositoryError::Conflict`.
pub trait PersonaRepository: Send + Sync {
    /// Insert a new persona and return it with its assigned id.
    fn create(
        &self,
        draft: &PersonaDraft,
    ) -> impl std::future::Future<Output = Result<Persona, RepositoryError>> + Send;

    /// Get a persona by id.
    fn get(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<Persona>, RepositoryError>> + Send;

    /// List all personas ordered by role_name.
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<Persona>, RepositoryError>> + Send;

    /// Overwrite every mutable field of an existing persona.
    ///
    /// Returns `RepositoryError::NotFound` if no row has `persona.id`.
    fn update(
        &self,
        persona: &Persona,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a persona. Returns whether a row was removed.
    ///
    /// Fails with `RepositoryError::Conflict` while sessions still reference it.
    fn delete(&self, id: i64)
    -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Number of chat sessions referencing the persona.
    fn count_sessions(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
