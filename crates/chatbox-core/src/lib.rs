//! Business logic and capability traits for Chatbox.
//!
//! This crate defines the "ports" (repository and provider traits) that the
//! infrastructure layer implements, plus the message-turn pipeline built on
//! them. It depends only on `chatbox-types` -- never on `chatbox-infra` or
//! any database/IO crate.

pub mod audio;
pub mod chat;
pub mod llm;
pub mod persona;
pub mod service;
