//! Speech synthesis and audio storage types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Content type of every stored audio asset.
pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// How the text handed to the audio cache should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioKind {
    /// Plain display text.
    Plain,
    /// Speech markup (SSML) produced by the model.
    Markup,
}

impl AudioKind {
    /// The synthesis text type matching this kind.
    pub fn text_type(self) -> TextType {
        match self {
            AudioKind::Plain => TextType::Text,
            AudioKind::Markup => TextType::Ssml,
        }
    }
}

/// Text type understood by the speech provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextType {
    Text,
    Ssml,
}

impl fmt::Display for TextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextType::Text => write!(f, "text"),
            TextType::Ssml => write!(f, "ssml"),
        }
    }
}

/// A synthesis voice offered by the speech provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub name: String,
    pub gender: String,
    pub language_code: String,
    pub language_name: String,
}

impl Voice {
    /// Whether this voice speaks a variant of English.
    pub fn is_english(&self) -> bool {
        self.language_code.starts_with("en-")
    }
}

/// Errors from the speech provider.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("speech provider error: {0}")]
    Provider(String),

    #[error("invalid speech input: {0}")]
    InvalidInput(String),

    #[error("speech request timed out after {0}s")]
    Timeout(u64),
}

/// Errors from the object store.
///
/// A missing object is not an error: `exists` reports it as `false`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object store error: {0}")]
    Backend(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("object store request timed out after {0}s")]
    Timeout(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_maps_to_text_type() {
        assert_eq!(AudioKind::Plain.text_type(), TextType::Text);
        assert_eq!(AudioKind::Markup.text_type(), TextType::Ssml);
    }

    #[test]
    fn test_voice_is_english() {
        let voice = Voice {
            id: "Joanna".to_string(),
            name: "Joanna".to_string(),
            gender: "Female".to_string(),
            language_code: "en-US".to_string(),
            language_name: "US English".to_string(),
        };
        assert!(voice.is_english());
        let german = Voice {
            language_code: "de-DE".to_string(),
            ..voice
        };
        assert!(!german.is_english());
    }
}
