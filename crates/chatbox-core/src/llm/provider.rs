//! LlmProvider trait definition.
//!
//! This is the core abstraction the model backend implements. Uses RPITIT for
//! every async method; the service layer is generic over the provider, so no
//! boxed wrapper is needed.

use chatbox_types::chat::Message;
use chatbox_types::llm::{CompletionRequest, CompletionResponse, LlmError, TokenCount};

/// Trait for language-model provider backends.
///
/// Implementations live in chatbox-infra (e.g., `GeminiProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full reply.
    ///
    /// An unknown model must surface as [`LlmError::ModelNotFound`] so callers
    /// can tell a bad model version apart from an unavailable provider.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;

    /// Count the tokens `messages` would occupy for `model`.
    fn count_tokens(
        &self,
        model: &str,
        messages: &[Message],
    ) -> impl std::future::Future<Output = Result<TokenCount, LlmError>> + Send;
}
