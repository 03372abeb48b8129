//! Chat session and message types for Chatbox.
//!
//! A session owns its full history as an ordered list of [`Message`]s. The
//! history is persisted as a single JSON document, so these types double as
//! the storage format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::llm::GenerationOverrides;

/// Maximum number of characters taken from the first user message for the
/// session display name.
pub const DISPLAY_NAME_MAX_CHARS: usize = 99;

/// Author of a message in a conversation.
///
/// The model provider calls the assistant side `model`, and that is the name
/// stored in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Model => write!(f, "model"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "model" => Ok(Role::Model),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single message in a session's history.
///
/// `markup` carries the speech-markup channel of a model reply when the
/// model followed the two-part response contract. `audio_ref` is the audio
/// URL resolved for the message, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_ref: Option<String>,
}

impl Message {
    /// A plain user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            markup: None,
            audio_ref: None,
        }
    }

    /// A plain model message.
    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
            markup: None,
            audio_ref: None,
        }
    }
}

/// A chat session and its complete history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub owner_id: Option<i64>,
    pub persona_id: Option<i64>,
    pub model_version: Option<String>,
    pub system_prompt: Option<String>,
    pub display_name: Option<String>,
    pub history: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Entry in a user's session list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub updated_at: DateTime<Utc>,
    pub title: Option<String>,
}

/// Request to open a new session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartSessionRequest {
    pub user_id: Option<i64>,
    pub system_prompt: Option<String>,
    pub persona_id: Option<i64>,
    #[serde(alias = "botVersion")]
    pub bot_version: Option<String>,
}

/// Request to send one user message into a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
    #[serde(default, alias = "personaId")]
    pub persona_id: Option<i64>,
    #[serde(default, alias = "botVersion")]
    pub bot_version: Option<String>,
    #[serde(default)]
    pub config: Option<GenerationOverrides>,
}

/// Everything the repository needs to commit one completed turn.
///
/// The repository appends `user_message` and `model_message` to whatever
/// history is stored at commit time, inside one transaction.
#[derive(Debug, Clone)]
pub struct TurnCommit {
    pub user_message: Message,
    pub model_message: Message,
    /// Persist a new persona reference on the session.
    pub persona_id: Option<i64>,
    /// Persist a new model version on the session.
    pub model_version: Option<String>,
}

/// Derive a session display name from the first user message.
pub fn display_name_from(message: &str) -> String {
    message.chars().take(DISPLAY_NAME_MAX_CHARS).collect()
}
