//! Configuration loader for Chatbox.
//!
//! Reads `config.toml` from the data directory (`~/.chatbox/` in production)
//! into [`ChatboxConfig`], falling back to defaults when the file is missing
//! or malformed, then overlays environment variables. Credentials only ever
//! come from the environment and are wrapped in [`SecretString`].

use std::path::{Path, PathBuf};

use chatbox_types::config::ChatboxConfig;
use secrecy::SecretString;

use crate::sqlite::pool::default_database_url;

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `CHATBOX_DATA_DIR` environment variable
/// 2. `~/.chatbox`
/// 3. `.chatbox` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CHATBOX_DATA_DIR") {
        return PathBuf::from(dir);
    }

    match dirs::home_dir() {
        Some(home) => home.join(".chatbox"),
        None => PathBuf::from(".chatbox"),
    }
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`ChatboxConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
pub async fn load_config(data_dir: &Path) -> ChatboxConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ChatboxConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ChatboxConfig::default();
        }
    };

    match toml::from_str::<ChatboxConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", config_path.display());
            ChatboxConfig::default()
        }
    }
}

/// Overlay environment variables onto a loaded config.
///
/// `lookup` is `std::env::var` in production. Blank values are ignored.
pub fn apply_env_overrides(config: &mut ChatboxConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(model) = get("GEMINI_MODEL_VERSION") {
        config.model.default_version = model;
    }
    if let Some(region) = get("AWS_REGION") {
        config.audio.region = region;
    }
    if let Some(bucket) = get("S3_BUCKET_NAME") {
        config.audio.bucket = Some(bucket);
    }
}

/// Database URL: `CHATBOX_DATABASE_URL`, else `chatbox.db` in the data dir.
pub fn database_url(data_dir: &Path, lookup: impl Fn(&str) -> Option<String>) -> String {
    lookup("CHATBOX_DATABASE_URL")
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default_database_url(data_dir))
}

/// AWS access key pair used for request signing.
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .finish()
    }
}

/// Credentials read from the environment.
#[derive(Default)]
pub struct Credentials {
    pub gemini_api_key: Option<SecretString>,
    pub aws: Option<AwsCredentials>,
}

impl Credentials {
    /// Read `GEMINI_API_KEY`, `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY`.
    ///
    /// AWS credentials are present only when both halves are set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let aws = match (get("AWS_ACCESS_KEY_ID"), get("AWS_SECRET_ACCESS_KEY")) {
            (Some(access_key_id), Some(secret)) => Some(AwsCredentials {
                access_key_id,
                secret_access_key: SecretString::from(secret),
            }),
            _ => None,
        };

        Self {
            gemini_api_key: get("GEMINI_API_KEY").map(SecretString::from),
            aws,
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}
