//! LLM provider implementations.
//!
//! Concrete implementations of the [`LlmProvider`](chatbox_core::llm::provider::LlmProvider)
//! trait defined in `chatbox-core`.

pub mod gemini;

pub use gemini::GeminiProvider;
