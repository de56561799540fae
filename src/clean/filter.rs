//! Stage 1: Character Filter
//!
//! Keeps Ethiopic letters, punctuation and numbers plus the allow-listed
//! non-Ethiopic symbols. Everything else, combining marks included, is
//! deleted.

use crate::charset::{classify, CharClass};
use unicode_normalization::UnicodeNormalization;

/// Per-code-point filter over one line.
#[derive(Debug, Clone, Default)]
pub struct CharFilter {
    extra_allowed: Vec<char>,
}

impl CharFilter {
    /// Creates a filter keeping exactly the default classes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also keeps the given characters when they would otherwise be dropped.
    ///
    /// Combining marks stay dropped regardless.
    pub fn with_extra_allowed(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.extra_allowed.extend(chars);
        self
    }

    /// Returns true if `c` survives the filter.
    pub fn keeps(&self, c: char) -> bool {
        match classify(c) {
            CharClass::EthiopicMark => false,
            CharClass::Disallowed => self.extra_allowed.contains(&c),
            _ => true,
        }
    }

    /// Filters a line (NFC-normalized first).
    pub fn apply(&self, line: &str) -> String {
        let mut result = String::with_capacity(line.len());
        for c in line.nfc() {
            if self.keeps(c) {
                result.push(c);
            }
        }
        result
    }
}

/// Filters a line with the default allow-list.
pub fn filter_chars(line: &str) -> String {
    CharFilter::default().apply(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::{is_allowed_non_ethiopic, is_ethiopic};

    #[test]
    fn test_drops_disallowed_symbols_and_latin() {
        assert_eq!(filter_chars("ሰላም @world! 123"), "ሰላም ! 123");
    }

    #[test]
    fn test_extra_allowed_keeps_latin_letters() {
        let filter = CharFilter::new().with_extra_allowed(('a'..='z').chain('A'..='Z'));
        assert_eq!(filter.apply("ሰላም @world! 123"), "ሰላም world! 123");
    }

    #[test]
    fn test_combining_marks_always_dropped() {
        let filter = CharFilter::new().with_extra_allowed(['\u{135F}']);
        assert_eq!(filter.apply("ቀ\u{135F}ን"), "ቀን");
    }

    #[test]
    fn test_keeps_ethiopic_punctuation_and_numbers() {
        assert_eq!(filter_chars("፩ ሰላም። «ቃል»"), "፩ ሰላም። «ቃል»");
    }

    #[test]
    fn test_output_closure() {
        let input = "Ⴀ ሀ\u{135D}ለ ™ ä ☺ \u{FEFF}፧ “x” ←";
        let output = filter_chars(input);
        assert!(output
            .chars()
            .all(|c| is_ethiopic(c) || is_allowed_non_ethiopic(c)));
        assert_eq!(output, " ሀለ    ፧ “” ");
    }
}
