//! Language-model abstractions for Chatbox.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `TokenCounter`: token measurement used by the conversation window

pub mod provider;
pub mod token_counter;
