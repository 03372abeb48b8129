//! SHA-256 content hashing for audio cache keys.
//!
//! Implements the `ContentHasher` trait from `chatbox-core` using the
//! `sha2` crate (RustCrypto ecosystem).

use sha2::{Digest, Sha256};

use chatbox_core::service::hash::ContentHasher;

/// SHA-256 implementation of `ContentHasher`.
///
/// Produces lowercase hex digests, so a (text, voice) pair always maps to the
/// same 64-character object key stem.
#[derive(Debug, Clone, Copy)]
pub struct Sha256ContentHasher;

impl Sha256ContentHasher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Sha256ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentHasher for Sha256ContentHasher {
    fn compute_hash(&self, content: &str) -> String {
        format!("{:x}", Sha256::digest(content.as_bytes()))
    }
}

/// Lowercase hex SHA-256 of raw bytes (request payload hashing).
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
