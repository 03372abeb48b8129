//! Cryptographic primitives.
//!
//! - `hash`: SHA-256 content fingerprints for the audio cache

pub mod hash;
