//! LLM request/response types for Chatbox.
//!
//! These types model the data shapes for language-model interactions:
//! completion requests, generation settings, usage, and errors. They are
//! provider-agnostic; the Gemini wire format lives in `chatbox-infra`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::chat::Message;

/// Per-request generation overrides, as accepted by the message endpoint.
///
/// `system_instruction` is not a sampling parameter; it replaces the
/// session/persona system prompt for this one turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOverrides {
    #[serde(default)]
    pub system_instruction: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub top_p: Option<f64>,
    #[serde(default)]
    pub top_k: Option<u32>,
    #[serde(default)]
    pub candidate_count: Option<u32>,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
}

/// Resolved sampling parameters sent to the provider.
///
/// A `None` field is omitted from the provider request so the provider's own
/// default applies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerationSettings {
    /// Layer request overrides on top of these defaults.
    ///
    /// Precedence per field: request override, then `self`, then provider
    /// default (left as `None`).
    pub fn overlay(&self, overrides: Option<&GenerationOverrides>) -> GenerationSettings {
        let Some(o) = overrides else {
            return self.clone();
        };
        GenerationSettings {
            temperature: o.temperature.or(self.temperature),
            top_p: o.top_p.or(self.top_p),
            top_k: o.top_k.or(self.top_k),
            candidate_count: o.candidate_count.or(self.candidate_count),
            max_output_tokens: o.max_output_tokens.or(self.max_output_tokens),
        }
    }

    /// Whether every field is left to the provider.
    pub fn is_empty(&self) -> bool {
        self == &GenerationSettings::default()
    }
}

/// Request to a language model for one reply.
///
/// `messages` is the conversation window; its last element is the new user
/// message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default)]
    pub settings: GenerationSettings,
}

/// A model reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Other,
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinishReason::Stop => write!(f, "stop"),
            FinishReason::MaxTokens => write!(f, "max_tokens"),
            FinishReason::Safety => write!(f, "safety"),
            FinishReason::Recitation => write!(f, "recitation"),
            FinishReason::Other => write!(f, "other"),
        }
    }
}

impl FromStr for FinishReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stop" => Ok(FinishReason::Stop),
            "max_tokens" => Ok(FinishReason::MaxTokens),
            "safety" => Ok(FinishReason::Safety),
            "recitation" => Ok(FinishReason::Recitation),
            "other" | "finish_reason_unspecified" => Ok(FinishReason::Other),
            other => Err(format!("invalid finish reason: '{other}'")),
        }
    }
}

/// Token usage for one completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Token count for a message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCount {
    pub total_tokens: u32,
}

/// Errors from language-model provider operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("rate limited")]
    RateLimited,

    #[error("authentication failed")]
    AuthenticationFailed,

    /// The requested model or model version does not exist.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("empty response: {0}")]
    EmptyResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_reason_roundtrip() {
        for reason in [
            FinishReason::Stop,
            FinishReason::MaxTokens,
            FinishReason::Safety,
            FinishReason::Recitation,
            FinishReason::Other,
        ] {
            let parsed: FinishReason = reason.to_string().parse().unwrap();
            assert_eq!(reason, parsed);
        }
    }

    #[test]
    fn test_overlay_prefers_request_values() {
        let defaults = GenerationSettings {
            temperature: Some(0.7),
            max_output_tokens: Some(1024),
            ..Default::default()
        };
        let overrides = GenerationOverrides {
            system_instruction: Some("ignored here".to_string()),
            temperature: Some(0.2),
            top_k: Some(40),
            ..Default::default()
        };

        let merged = defaults.overlay(Some(&overrides));
        assert_eq!(merged.temperature, Some(0.2));
        assert_eq!(merged.top_k, Some(40));
        assert_eq!(merged.max_output_tokens, Some(1024));
        assert!(merged.top_p.is_none());
    }

    #[test]
    fn test_overlay_without_overrides_keeps_defaults() {
        let defaults = GenerationSettings::default();
        assert!(defaults.overlay(None).is_empty());
    }

    #[test]
    fn test_settings_skip_unset_fields() {
        let settings = GenerationSettings {
            temperature: Some(0.5),
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(json, r#"{"temperature":0.5}"#);
    }

    #[test]
    fn test_model_not_found_display() {
        let err = LlmError::ModelNotFound("gemini-9".to_string());
        assert_eq!(err.to_string(), "model not found: gemini-9");
    }
}
