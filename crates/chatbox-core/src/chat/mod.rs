//! Chat sessions and the message-turn pipeline.
//!
//! - `window`: token-bounded conversation window
//! - `reply`: display/markup channel parser for model replies
//! - `repository`: `ChatRepository` trait implemented in chatbox-infra
//! - `service`: `ChatService` orchestrating a full turn

pub mod reply;
pub mod repository;
pub mod service;
pub mod window;
