//! ContentHasher trait for content-addressed keys.
//!
//! Defined in chatbox-core so the audio cache can derive object keys without
//! coupling to a specific hashing algorithm. The `Sha256ContentHasher` adapter
//! lives in chatbox-infra.

/// Abstraction over content hashing.
///
/// Implementations must be deterministic: equal input always yields the same
/// hex string.
pub trait ContentHasher: Send + Sync {
    /// Compute a hex-encoded hash of the given content.
    fn compute_hash(&self, content: &str) -> String;
}
