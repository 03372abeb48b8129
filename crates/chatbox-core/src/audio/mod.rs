//! Speech synthesis and the content-addressed audio cache.
//!
//! - `speech`: `SpeechSynthesizer` trait (Polly in chatbox-infra)
//! - `store`: `ObjectStore` trait (S3 in chatbox-infra)
//! - `ssml`: provider compatibility fixes for speech markup
//! - `cache`: `AudioCache` tying the three together

pub mod cache;
pub mod speech;
pub mod ssml;
pub mod store;
