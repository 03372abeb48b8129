//! Personas: storage port, CRUD service and system prompt rendering.

pub mod prompt;
pub mod repository;
pub mod service;
