//! Caption sanitization.
//!
//! The text-draw filter chokes on emoji, control characters and very long
//! lines, so every script is reduced to a single line of printable ASCII
//! before it reaches the encoder.

use std::fmt;

use serde::Serialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Maximum caption length in characters.
pub const MAX_CAPTION_CHARS: usize = 160;

/// Caption used when nothing printable survives sanitization.
pub const DEFAULT_CAPTION: &str = "PitchPilot";

/// A caption guaranteed to be non-empty printable ASCII (0x20..=0x7E),
/// free of repeated or edge whitespace, and at most [`MAX_CAPTION_CHARS`] long.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SanitizedText {
    text: String,
    fallback: bool,
}

impl SanitizedText {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether the default caption replaced a degenerate input.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the caption is empty. Sanitized captions never are.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for SanitizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for SanitizedText {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// Sanitize arbitrary script text into an overlay-safe caption.
///
/// Text is decomposed (NFKD) so accented letters keep their base letter,
/// combining marks are dropped, and any other character outside printable
/// ASCII becomes a space. Whitespace runs collapse to one space, the
/// result is trimmed and cut to [`MAX_CAPTION_CHARS`].
pub fn sanitize(raw: &str) -> SanitizedText {
    let mut mapped = String::with_capacity(raw.len());
    for c in raw.nfkd() {
        if is_combining_mark(c) {
            continue;
        }
        if is_printable_ascii(c) {
            mapped.push(c);
        } else {
            mapped.push(' ');
        }
    }

    let collapsed = mapped.split_whitespace().collect::<Vec<_>>().join(" ");

    // Only ASCII remains, so byte offsets are char offsets.
    let cut = collapsed.len().min(MAX_CAPTION_CHARS);
    let caption = collapsed[..cut].trim_end();

    if caption.is_empty() {
        tracing::debug!(raw_len = raw.len(), "Caption empty after sanitizing, using default");
        return SanitizedText {
            text: DEFAULT_CAPTION.to_string(),
            fallback: true,
        };
    }

    SanitizedText {
        text: caption.to_string(),
        fallback: false,
    }
}

fn is_printable_ascii(c: char) -> bool {
    (' '..='~').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plain_script_passes_through() {
        let text = sanitize("Build funnels that sell themselves.");
        assert_eq!(text.as_str(), "Build funnels that sell themselves.");
        assert!(!text.is_fallback());
    }

    #[test]
    fn test_empty_input_falls_back_to_default() {
        let text = sanitize("");
        assert_eq!(text.as_str(), DEFAULT_CAPTION);
        assert!(text.is_fallback());
    }

    #[test]
    fn test_emoji_only_input_falls_back_to_default() {
        let text = sanitize("🚀🔥 ✨");
        assert_eq!(text.as_str(), DEFAULT_CAPTION);
        assert!(text.is_fallback());
    }

    #[test]
    fn test_accents_keep_base_letters() {
        assert_eq!(sanitize("Café crème brûlée").as_str(), "Cafe creme brulee");
    }

    #[test]
    fn test_compatibility_forms_are_decomposed() {
        // Full-width letters and the "fi" ligature decompose to ASCII.
        assert_eq!(sanitize("ＡＢＣ ﬁnal").as_str(), "ABC final");
    }

    #[test]
    fn test_newlines_and_tabs_separate_words() {
        let text = sanitize("Hook line\nValue line\t\tCTA   now\r\n");
        assert_eq!(text.as_str(), "Hook line Value line CTA now");
    }

    #[test]
    fn test_emoji_between_words_becomes_single_space() {
        assert_eq!(sanitize("Launch🚀today").as_str(), "Launch today");
    }

    #[test]
    fn test_long_input_is_truncated() {
        let raw = "word ".repeat(100);
        let text = sanitize(&raw);
        assert!(text.len() <= MAX_CAPTION_CHARS);
        assert!(!text.as_str().ends_with(' '));
        assert!(text.as_str().starts_with("word word"));
    }

    #[test]
    fn test_exact_limit_is_kept() {
        let raw = "a".repeat(MAX_CAPTION_CHARS);
        assert_eq!(sanitize(&raw).len(), MAX_CAPTION_CHARS);

        let raw = "a".repeat(MAX_CAPTION_CHARS + 1);
        assert_eq!(sanitize(&raw).len(), MAX_CAPTION_CHARS);
    }

    #[test]
    fn test_special_filter_characters_survive() {
        // Escaping is the scratch file's job; the caption keeps them verbatim.
        let text = sanitize("50% off: [today] only, 'really'");
        assert_eq!(text.as_str(), "50% off: [today] only, 'really'");
    }

    proptest! {
        #[test]
        fn prop_output_is_printable_ascii(raw in any::<String>()) {
            let text = sanitize(&raw);
            prop_assert!(text.as_str().bytes().all(|b| (0x20..=0x7e).contains(&b)));
        }

        #[test]
        fn prop_output_is_bounded_and_non_empty(raw in "\\PC{0,400}") {
            let text = sanitize(&raw);
            prop_assert!(!text.is_empty());
            prop_assert!(text.len() <= MAX_CAPTION_CHARS);
        }

        #[test]
        fn prop_output_has_no_edge_or_repeated_spaces(raw in "[ a-z\\t\\n🚀é]{0,300}") {
            let text = sanitize(&raw);
            let s = text.as_str();
            prop_assert!(!s.starts_with(' '));
            prop_assert!(!s.ends_with(' '));
            prop_assert!(!s.contains("  "));
        }

        #[test]
        fn prop_sanitize_is_idempotent(raw in any::<String>()) {
            let once = sanitize(&raw);
            let twice = sanitize(once.as_str());
            prop_assert_eq!(once.as_str(), twice.as_str());
        }
    }
}
