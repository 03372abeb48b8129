//! S3ObjectStore -- concrete [`ObjectStore`] over the S3 REST API.
//!
//! Virtual-hosted addressing (`{bucket}.s3.{region}.amazonaws.com`). HEAD and
//! PUT are header-signed; reads go through presigned GET URLs computed
//! locally.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use hmac::digest::InvalidLength;
use tracing::debug;

use chatbox_core::audio::store::ObjectStore;
use chatbox_types::audio::StoreError;

use super::sigv4::{AwsSigner, SignableRequest, uri_encode};
use crate::crypto::hash::sha256_hex;

const SERVICE: &str = "s3";

/// Longest lifetime S3 accepts for a presigned URL (7 days).
pub const MAX_PRESIGN_SECS: u64 = 7 * 24 * 3600;

/// S3 bucket used as the audio object store.
pub struct S3ObjectStore {
    client: reqwest::Client,
    signer: Arc<AwsSigner>,
    host: String,
}

impl S3ObjectStore {
    pub fn new(signer: Arc<AwsSigner>, bucket: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Backend(format!("failed to build HTTP client: {e}")))?;
        let host = format!("{bucket}.s3.{}.amazonaws.com", signer.region());

        Ok(Self {
            client,
            signer,
            host,
        })
    }

    fn path(key: &str) -> String {
        format!("/{}", uri_encode(key, false))
    }

    fn signed(
        &self,
        method: reqwest::Method,
        key: &str,
        extra_headers: &[(&str, &str)],
        payload_hash: &str,
    ) -> Result<reqwest::RequestBuilder, StoreError> {
        let path = Self::path(key);
        let mut headers: Vec<(&str, &str)> = vec![("x-amz-content-sha256", payload_hash)];
        headers.extend_from_slice(extra_headers);

        let signed = self.signer.sign(
            SERVICE,
            &SignableRequest {
                method: method.as_str(),
                host: &self.host,
                path: &path,
                query: &[],
                headers: &headers,
                payload_hash,
            },
            Utc::now(),
        )
        .map_err(signing_error)?;

        let mut builder = self
            .client
            .request(method, format!("https://{}{}", self.host, path));
        for (name, value) in &signed {
            builder = builder.header(name.as_str(), value.as_str());
        }
        Ok(builder)
    }
}

fn transport_error(e: reqwest::Error) -> StoreError {
    StoreError::Backend(format!("HTTP request failed: {e}"))
}

fn signing_error(e: InvalidLength) -> StoreError {
    StoreError::Backend(format!("failed to sign request: {e}"))
}

impl ObjectStore for S3ObjectStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let response = self
            .signed(reqwest::Method::HEAD, key, &[], &sha256_hex(b""))?
            .send()
            .await
            .map_err(transport_error)?;

        match response.status().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            403 => Err(StoreError::AccessDenied(key.to_string())),
            status => Err(StoreError::Backend(format!("HEAD {key} returned HTTP {status}"))),
        }
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        let payload_hash = sha256_hex(&bytes);
        let size = bytes.len();
        let response = self
            .signed(
                reqwest::Method::PUT,
                key,
                &[("content-type", content_type)],
                &payload_hash,
            )?
            .body(bytes)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                403 => StoreError::AccessDenied(key.to_string()),
                code => StoreError::Backend(format!("PUT {key} returned HTTP {code}: {body}")),
            });
        }

        debug!(key, size, "uploaded audio object");
        Ok(())
    }

    async fn presign(&self, key: &str, ttl_secs: u64) -> Result<String, StoreError> {
        self.signer
            .presign_get(
                SERVICE,
                &self.host,
                &Self::path(key),
                ttl_secs.clamp(1, MAX_PRESIGN_SECS),
                Utc::now(),
            )
            .map_err(signing_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AwsCredentials;
    use secrecy::SecretString;

    fn store() -> S3ObjectStore {
        let signer = AwsSigner::new(
            AwsCredentials {
                access_key_id: "AKIDEXAMPLE".to_string(),
                secret_access_key: SecretString::from("secret".to_string()),
            },
            "us-west-2",
        );
        S3ObjectStore::new(Arc::new(signer), "chatbox-audio", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_presign_points_at_bucket_object() {
        let key = format!("{}.mp3", "a".repeat(64));
        let url = store().presign(&key, 3600).await.unwrap();

        assert!(url.starts_with(&format!(
            "https://chatbox-audio.s3.us-west-2.amazonaws.com/{key}?X-Amz-Algorithm=AWS4-HMAC-SHA256"
        )));
        assert!(url.contains("X-Amz-Expires=3600"));
        assert!(url.contains("X-Amz-Signature="));
    }

    #[tokio::test]
    async fn test_presign_ttl_is_capped() {
        let url = store().presign("k.mp3", 30 * 24 * 3600).await.unwrap();
        assert!(url.contains(&format!("X-Amz-Expires={MAX_PRESIGN_SECS}")));
    }
}
