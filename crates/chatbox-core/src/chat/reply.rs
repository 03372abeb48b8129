//! Splits a model reply into display text and speech markup.
//!
//! The audio-performance prompt asks the model to answer in two sections:
//!
//! ```text
//! [DISPLAY_TEXT]
//! text shown to the user
//! [SSML_TEXT]
//! <speak>markup sent to speech synthesis</speak>
//! ```
//!
//! The model is not obliged to comply. Any reply that does not follow the
//! layout is used verbatim as display text with no markup.

use tracing::warn;

/// Marker opening the display section.
pub const DISPLAY_MARKER: &str = "[DISPLAY_TEXT]";
/// Marker opening the speech-markup section.
pub const MARKUP_MARKER: &str = "[SSML_TEXT]";

/// A model reply split into its channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub display_text: String,
    pub markup: Option<String>,
}

impl ParsedReply {
    fn plain(raw: &str) -> Self {
        Self {
            display_text: raw.to_string(),
            markup: None,
        }
    }
}

/// Parse a raw reply. Never fails; malformed layouts degrade to plain text.
pub fn parse_reply(raw: &str) -> ParsedReply {
    let Some((head, tail)) = raw.split_once(MARKUP_MARKER) else {
        return ParsedReply::plain(raw);
    };

    let head = head.trim_start();
    let display_text = head.strip_prefix(DISPLAY_MARKER).unwrap_or(head).trim();
    let markup = tail.trim();

    let display_empty = display_text.is_empty();
    let markup_empty = markup.is_empty();
    if display_empty || markup_empty {
        warn!(
            display_empty,
            markup_empty, "malformed two-part reply, using raw text"
        );
        return ParsedReply::plain(raw);
    }

    ParsedReply {
        display_text: display_text.to_string(),
        markup: Some(markup.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_reply_passes_through() {
        let parsed = parse_reply("hello");
        assert_eq!(parsed.display_text, "hello");
        assert!(parsed.markup.is_none());
    }

    #[test]
    fn test_two_part_reply() {
        let parsed = parse_reply("[DISPLAY_TEXT]\nHi there\n[SSML_TEXT]\n<speak>Hi there</speak>");
        assert_eq!(parsed.display_text, "Hi there");
        assert_eq!(parsed.markup.as_deref(), Some("<speak>Hi there</speak>"));
    }

    #[test]
    fn test_empty_markup_falls_back_to_raw() {
        let raw = "[SSML_TEXT]\n";
        let parsed = parse_reply(raw);
        assert_eq!(parsed.display_text, raw);
        assert!(parsed.markup.is_none());
    }

    #[test]
    fn test_empty_display_falls_back_to_raw() {
        let raw = "[DISPLAY_TEXT]\n  \n[SSML_TEXT]\n<speak>Hi</speak>";
        let parsed = parse_reply(raw);
        assert_eq!(parsed.display_text, raw);
        assert!(parsed.markup.is_none());
    }

    #[test]
    fn test_missing_display_marker_still_splits() {
        let parsed = parse_reply("Hi there\n[SSML_TEXT]\n<speak>Hi there</speak>");
        assert_eq!(parsed.display_text, "Hi there");
        assert_eq!(parsed.markup.as_deref(), Some("<speak>Hi there</speak>"));
    }

    #[test]
    fn test_splits_on_first_markup_marker_only() {
        let parsed = parse_reply("[DISPLAY_TEXT]A[SSML_TEXT]<speak>B [SSML_TEXT] C</speak>");
        assert_eq!(parsed.display_text, "A");
        assert_eq!(parsed.markup.as_deref(), Some("<speak>B [SSML_TEXT] C</speak>"));
    }
}
