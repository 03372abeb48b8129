//! Infrastructure layer for Chatbox.
//!
//! Implementations of the traits defined in `chatbox-core`: SQLite
//! repositories, the Gemini model provider, Amazon Polly speech, S3 audio
//! storage, SHA-256 content hashing, and the configuration loader.

pub mod aws;
pub mod config;
pub mod crypto;
pub mod llm;
pub mod sqlite;
