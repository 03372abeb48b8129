//! Amazon Web Services adapters.
//!
//! - `sigv4`: Signature Version 4 request signing and presigned URLs
//! - `polly`: `SpeechSynthesizer` over Amazon Polly
//! - `s3`: `ObjectStore` over an S3 bucket

pub mod polly;
pub mod s3;
pub mod sigv4;

pub use polly::PollySynthesizer;
pub use s3::S3ObjectStore;
pub use sigv4::AwsSigner;
