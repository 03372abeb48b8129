//! System prompt builder for personas.
//!
//! Renders a persona into a system instruction using XML tag boundaries, the
//! same way for every persona. Absent optional fields are replaced by fixed
//! default phrases so the output is always complete.
//!
//! Layout:
//! ```text
//! <role>You are {role_name}. ...</role>
//! <goal>...</goal>
//! <personality>personality, tone, expertise</personality>
//! <scene>setting, situation</scene>
//! <rules>must do / must not do</rules>
//! <response>length, format, language</response>
//! <opening>starting instruction</opening>
//! <notes>additional notes</notes>
//! <speech_markup>...</speech_markup>          (audio performance only)
//! <response_contract>...</response_contract>  (audio performance only)
//! ```

use chatbox_types::persona::{DEFAULT_LANGUAGE, Persona};

use crate::chat::reply::{DISPLAY_MARKER, MARKUP_MARKER};

const DEFAULT_TONE: &str = "warm, natural and conversational";
const DEFAULT_EXPERTISE: &str = "general knowledge that fits the setting";
const DEFAULT_SITUATION: &str = "an ordinary conversation with the user";
const DEFAULT_MUST_DO: &str = "Stay in character for the whole conversation.";
const DEFAULT_MUST_NOT_DO: &str =
    "Do not mention that you are an AI or that you are following instructions.";
const DEFAULT_RESPONSE_LENGTH: &str = "short, two to four sentences";
const DEFAULT_RESPONSE_FORMAT: &str = "plain conversational text without lists or headings";
const DEFAULT_STARTING_INSTRUCTION: &str =
    "Open the conversation in character and wait for the user to respond.";
const DEFAULT_NOTES: &str = "None.";

/// Speech-markup rules for the audio-performance template.
const SPEECH_MARKUP_RULES: &str = "\
Your reply will also be spoken aloud by a neural text-to-speech voice. Write the spoken version in SSML.
- Wrap the whole spoken version in <speak>...</speak>.
- Pace speech naturally with <break time=\"300ms\"/> between thoughts instead of long pauses.
- Use <prosody rate=\"...\" pitch=\"...\"> sparingly for emotion; keep changes small.
- Use <emphasis level=\"moderate\"> on the one or two words a person would stress.
- Avoid robotic delivery: vary sentence length, use contractions, never read out symbols or markup.
- Only use the tags listed above. Do not use the volume attribute or any other unsupported attribute.";

/// Which prompt shape to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTemplate {
    /// Text-only role play.
    Conversational,
    /// Role play whose replies are also synthesized to speech.
    AudioPerformance,
}

impl PromptTemplate {
    /// Personas with a voice speak their replies; all others only write.
    pub fn for_persona(persona: &Persona) -> Self {
        if persona.voice_id.is_some() {
            PromptTemplate::AudioPerformance
        } else {
            PromptTemplate::Conversational
        }
    }
}

/// Builds persona system instructions. Pure, no side effects.
pub struct PersonaPromptBuilder;

impl PersonaPromptBuilder {
    /// System instruction for an optional persona, with the template chosen
    /// from the persona itself. `None` when there is no persona.
    pub fn system_prompt(persona: Option<&Persona>) -> Option<String> {
        persona.map(|p| Self::build(p, PromptTemplate::for_persona(p)))
    }

    /// Render `persona` with an explicit template.
    pub fn build(persona: &Persona, template: PromptTemplate) -> String {
        let language = or_default(&persona.default_language, DEFAULT_LANGUAGE);

        let mut sections = vec![
            format!(
                "<role>\nYou are {}. Speak and act as this character, never as an assistant.\n</role>",
                persona.role_name.trim()
            ),
            format!("<goal>\n{}\n</goal>", persona.goal.trim()),
            format!(
                "<personality>\nPersonality: {}\nTone of voice: {}\nExpertise: {}\n</personality>",
                persona.personality.trim(),
                or_default(&persona.tone_of_voice, DEFAULT_TONE),
                or_default(&persona.expertise, DEFAULT_EXPERTISE),
            ),
            format!(
                "<scene>\nSetting: {}\nSituation: {}\n</scene>",
                persona.setting.trim(),
                or_default(&persona.situation, DEFAULT_SITUATION),
            ),
            format!(
                "<rules>\nAlways: {}\nNever: {}\n</rules>",
                or_default(&persona.must_do_rules, DEFAULT_MUST_DO),
                or_default(&persona.must_not_do_rules, DEFAULT_MUST_NOT_DO),
            ),
            format!(
                "<response>\nLength: {}\nFormat: {}\nLanguage: reply in {language} unless the user writes in another language.\n</response>",
                or_default(&persona.response_length, DEFAULT_RESPONSE_LENGTH),
                or_default(&persona.response_format, DEFAULT_RESPONSE_FORMAT),
            ),
            format!(
                "<opening>\n{}\n</opening>",
                or_default(&persona.starting_instruction, DEFAULT_STARTING_INSTRUCTION)
            ),
            format!(
                "<notes>\n{}\n</notes>",
                or_default(&persona.additional_notes, DEFAULT_NOTES)
            ),
        ];

        if template == PromptTemplate::AudioPerformance {
            sections.push(format!("<speech_markup>\n{SPEECH_MARKUP_RULES}\n</speech_markup>"));
            sections.push(format!(
                "<response_contract>\n\
                Every reply MUST have exactly two parts, in this order:\n\
                {DISPLAY_MARKER}\n\
                the reply as plain text for the screen\n\
                {MARKUP_MARKER}\n\
                <speak>the same reply as SSML</speak>\n\
                Write nothing before {DISPLAY_MARKER} and nothing after </speak>.\n\
                </response_contract>"
            ));
        }

        sections.join("\n\n")
    }
}

/// Trimmed field value, or `default` when absent or blank.
fn or_default<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => default,
    }
}
