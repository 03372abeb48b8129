//! Shared domain types for Chatbox.
//!
//! This crate contains the core domain types used across the Chatbox service:
//! chat sessions and messages, personas, language-model requests, speech
//! and audio storage, configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod audio;
pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod persona;
