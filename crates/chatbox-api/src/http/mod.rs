//! HTTP/REST API layer for Chatbox.
//!
//! Axum-based REST API under `/api/` with an envelope response format and
//! CORS support.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod response;
pub mod router;
