//! ObjectStore trait definition.

use chatbox_types::audio::StoreError;

/// Blob storage holding synthesized audio.
///
/// Implementations live in chatbox-infra (e.g., `S3ObjectStore`).
pub trait ObjectStore: Send + Sync {
    /// Whether an object exists under `key`. Not-found is `Ok(false)`; only
    /// other failures are errors.
    fn exists(&self, key: &str)
    -> impl std::future::Future<Output = Result<bool, StoreError>> + Send;

    /// Store `bytes` under `key`.
    fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Issue a time-limited URL for reading `key`.
    fn presign(
        &self,
        key: &str,
        ttl_secs: u64,
    ) -> impl std::future::Future<Output = Result<String, StoreError>> + Send;
}
