//! Service configuration types for Chatbox.
//!
//! `ChatboxConfig` represents `config.toml` in the data directory. Every field
//! has a default, so an empty or missing file is valid. Credentials are not
//! part of this file; they come from the environment.

use serde::{Deserialize, Serialize};

use crate::llm::GenerationSettings;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatboxConfig {
    /// Language model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Speech and audio storage settings.
    #[serde(default)]
    pub audio: AudioConfig,

    /// Upper bound for every remote call (model, speech, object store).
    #[serde(default = "default_remote_timeout_secs")]
    pub remote_timeout_secs: u64,
}

fn default_remote_timeout_secs() -> u64 {
    60
}

impl Default for ChatboxConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            audio: AudioConfig::default(),
            remote_timeout_secs: default_remote_timeout_secs(),
        }
    }
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model version used when neither the request nor the session names one.
    #[serde(default = "default_model_version")]
    pub default_version: String,

    /// Token budget for the conversation window sent with each turn.
    #[serde(default = "default_max_conversation_tokens")]
    pub max_conversation_tokens: u32,

    /// Generation defaults applied beneath per-request overrides.
    #[serde(default)]
    pub generation: GenerationSettings,
}

fn default_model_version() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_max_conversation_tokens() -> u32 {
    20_000
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default_version: default_model_version(),
            max_conversation_tokens: default_max_conversation_tokens(),
            generation: GenerationSettings::default(),
        }
    }
}

/// Speech and audio storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Set to false to store turns without audio even when AWS is configured.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Voice used when the session has no persona voice.
    #[serde(default = "default_voice")]
    pub default_voice: String,

    /// Lifetime of issued audio URLs.
    #[serde(default = "default_url_ttl_secs")]
    pub url_ttl_secs: u64,

    /// AWS region for speech and storage.
    #[serde(default = "default_region")]
    pub region: String,

    /// Bucket holding synthesized audio.
    #[serde(default)]
    pub bucket: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_voice() -> String {
    "Joanna".to_string()
}

fn default_url_ttl_secs() -> u64 {
    3600
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            default_voice: default_voice(),
            url_ttl_secs: default_url_ttl_secs(),
            region: default_region(),
            bucket: None,
        }
    }
}
