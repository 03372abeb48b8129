//! Persona types.
//!
//! A persona is a named bundle of prompt-construction fields. Sessions refer
//! to personas by id; the system instruction is rebuilt from the persona on
//! every turn, so edits take effect immediately.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default language for new personas.
pub const DEFAULT_LANGUAGE: &str = "English";

/// A stored persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: i64,
    pub role_name: String,
    pub avatar_url: Option<String>,
    pub default_language: Option<String>,
    pub goal: String,
    pub personality: String,
    pub tone_of_voice: Option<String>,
    pub expertise: Option<String>,
    pub setting: String,
    pub situation: Option<String>,
    pub must_do_rules: Option<String>,
    pub must_not_do_rules: Option<String>,
    pub response_length: Option<String>,
    pub response_format: Option<String>,
    pub starting_instruction: Option<String>,
    pub additional_notes: Option<String>,
    /// Speech voice used for this persona's audio. Personas with a voice get
    /// the audio-performance prompt template.
    pub voice_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaDraft {
    pub role_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default = "default_language")]
    pub default_language: Option<String>,
    pub goal: String,
    pub personality: String,
    #[serde(default)]
    pub tone_of_voice: Option<String>,
    #[serde(default)]
    pub expertise: Option<String>,
    pub setting: String,
    #[serde(default)]
    pub situation: Option<String>,
    #[serde(default)]
    pub must_do_rules: Option<String>,
    #[serde(default)]
    pub must_not_do_rules: Option<String>,
    #[serde(default)]
    pub response_length: Option<String>,
    #[serde(default)]
    pub response_format: Option<String>,
    #[serde(default)]
    pub starting_instruction: Option<String>,
    #[serde(default)]
    pub additional_notes: Option<String>,
    #[serde(default)]
    pub voice_id: Option<String>,
}

fn default_language() -> Option<String> {
    Some(DEFAULT_LANGUAGE.to_string())
}

/// Partial update for a persona. Only the supplied fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonaPatch {
    pub role_name: Option<String>,
    pub avatar_url: Option<String>,
    pub default_language: Option<String>,
    pub goal: Option<String>,
    pub personality: Option<String>,
    pub tone_of_voice: Option<String>,
    pub expertise: Option<String>,
    pub setting: Option<String>,
    pub situation: Option<String>,
    pub must_do_rules: Option<String>,
    pub must_not_do_rules: Option<String>,
    pub response_length: Option<String>,
    pub response_format: Option<String>,
    pub starting_instruction: Option<String>,
    pub additional_notes: Option<String>,
    pub voice_id: Option<String>,
}

impl PersonaPatch {
    /// Apply the supplied fields onto an existing persona.
    pub fn apply_to(self, persona: &mut Persona) {
        fn set<T>(target: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *target = v;
            }
        }
        fn set_opt<T>(target: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *target = value;
            }
        }

        set(&mut persona.role_name, self.role_name);
        set(&mut persona.goal, self.goal);
        set(&mut persona.personality, self.personality);
        set(&mut persona.setting, self.setting);
        set_opt(&mut persona.avatar_url, self.avatar_url);
        set_opt(&mut persona.default_language, self.default_language);
        set_opt(&mut persona.tone_of_voice, self.tone_of_voice);
        set_opt(&mut persona.expertise, self.expertise);
        set_opt(&mut persona.situation, self.situation);
        set_opt(&mut persona.must_do_rules, self.must_do_rules);
        set_opt(&mut persona.must_not_do_rules, self.must_not_do_rules);
        set_opt(&mut persona.response_length, self.response_length);
        set_opt(&mut persona.response_format, self.response_format);
        set_opt(&mut persona.starting_instruction, self.starting_instruction);
        set_opt(&mut persona.additional_notes, self.additional_notes);
        set_opt(&mut persona.voice_id, self.voice_id);
    }
}
