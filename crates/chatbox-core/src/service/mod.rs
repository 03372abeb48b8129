//! Cross-cutting service abstractions.

pub mod hash;
