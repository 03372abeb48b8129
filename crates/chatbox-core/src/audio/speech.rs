//! SpeechSynthesizer trait definition.

use chatbox_types::audio::{SpeechError, TextType, Voice};

/// Text-to-speech backend.
///
/// Implementations live in chatbox-infra (e.g., `PollySynthesizer`).
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` with `voice_id`, returning encoded audio bytes.
    fn synthesize(
        &self,
        text: &str,
        text_type: TextType,
        voice_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, SpeechError>> + Send;

    /// Voices available for synthesis.
    fn list_voices(&self)
    -> impl std::future::Future<Output = Result<Vec<Voice>, SpeechError>> + Send;
}

/// English voices only, sorted by language name then voice name.
pub fn english_voices(voices: Vec<Voice>) -> Vec<Voice> {
    let mut english: Vec<Voice> = voices.into_iter().filter(Voice::is_english).collect();
    english.sort_by(|a, b| {
        a.language_name
            .cmp(&b.language_name)
            .then_with(|| a.name.cmp(&b.name))
    });
    english
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(name: &str, code: &str, language: &str) -> Voice {
        Voice {
            id: name.to_string(),
            name: name.to_string(),
            gender: "Female".to_string(),
            language_code: code.to_string(),
            language_name: language.to_string(),
        }
    }

    #[test]
    fn test_english_voices_filtered_and_sorted() {
        let voices = vec![
            voice("Joanna", "en-US", "US English"),
            voice("Marlene", "de-DE", "German"),
            voice("Amy", "en-GB", "British English"),
            voice("Emma", "en-GB", "British English"),
            voice("Danielle", "en-US", "US English"),
        ];

        let names: Vec<String> = english_voices(voices).into_iter().map(|v| v.name).collect();

        assert_eq!(names, ["Amy", "Emma", "Danielle", "Joanna"]);
    }
}
