//! Narrow SSML compatibility fixes applied before synthesis.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{Captures, Regex};

fn prosody_tag() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)<prosody\b[^>]*>").ok())
        .as_ref()
}

fn volume_attr() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r#"(?i)\s+volume\s*=\s*(?:"[^"]*"|'[^']*')"#).ok())
        .as_ref()
}

/// Remove `volume` attributes from `<prosody>` opening tags.
///
/// The neural voices reject `volume`; every other tag and attribute is left
/// untouched.
pub fn sanitize_ssml(markup: &str) -> Cow<'_, str> {
    let (Some(tag), Some(volume)) = (prosody_tag(), volume_attr()) else {
        return Cow::Borrowed(markup);
    };
    tag.replace_all(markup, |caps: &Captures| volume.replace_all(&caps[0], "").into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_volume_from_prosody() {
        let input = r#"<speak><prosody rate="slow" volume="loud">Hi</prosody></speak>"#;
        assert_eq!(
            sanitize_ssml(input),
            r#"<speak><prosody rate="slow">Hi</prosody></speak>"#
        );
    }

    #[test]
    fn test_single_quoted_and_only_attribute() {
        let input = "<speak><prosody volume='+6dB'>Hey</prosody></speak>";
        assert_eq!(sanitize_ssml(input), "<speak><prosody>Hey</prosody></speak>");
    }

    #[test]
    fn test_other_tags_untouched() {
        let input = r#"<speak><audio volume="x"/><emphasis level="strong">No</emphasis></speak>"#;
        assert_eq!(sanitize_ssml(input), input);
    }

    #[test]
    fn test_multiple_prosody_tags() {
        let input = r#"<prosody volume="soft" pitch="high">a</prosody><prosody pitch="low" volume="x-loud">b</prosody>"#;
        assert_eq!(
            sanitize_ssml(input),
            r#"<prosody pitch="high">a</prosody><prosody pitch="low">b</prosody>"#
        );
    }
}
