//! Character classification for Ethiopic corpora.
//!
//! Every code point belongs to exactly one [`CharClass`]. The tables in this
//! module are static; nothing here changes at runtime.

use std::ops::RangeInclusive;

/// Assigned part of the Ethiopic block.
pub const ETHIOPIC_RANGE: RangeInclusive<u32> = 0x1200..=0x137C;
/// Ethiopic syllables.
pub const ETHIOPIC_LETTERS: RangeInclusive<u32> = 0x1200..=0x135A;
/// Combining marks, never kept.
pub const ETHIOPIC_MARKS: RangeInclusive<u32> = 0x135D..=0x135F;
/// Section mark through paragraph separator.
pub const ETHIOPIC_PUNCTUATION_RANGE: RangeInclusive<u32> = 0x1360..=0x1368;
/// Digits one..nine and the tens/hundred/ten-thousand numbers.
pub const ETHIOPIC_NUMBERS: RangeInclusive<u32> = 0x1369..=0x137C;

/// Classification of a single code point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    /// Ethiopic syllable (U+1200..=U+135A, assigned).
    EthiopicLetter,
    /// Ethiopic combining mark, always dropped.
    EthiopicMark,
    /// Ethiopic punctuation (፠ ፡ ። ፣ ፤ ፥ ፦ ፧ ፨).
    EthiopicPunctuation,
    /// Ethiopic digit or number.
    EthiopicNumber,
    /// Non-Ethiopic symbol on the allow-list.
    AllowedSymbol,
    /// Anything else.
    Disallowed,
}

impl CharClass {
    /// Returns true if the character filter keeps characters of this class.
    pub fn is_kept(self) -> bool {
        !matches!(self, CharClass::EthiopicMark | CharClass::Disallowed)
    }
}

/// Non-Ethiopic characters that survive the character filter.
pub const ALLOWED_NON_ETHIOPIC: &[char] = &[
    // minus, en & em dashes
    '−', '–', '—',
    // ellipsis and bullet
    '…', '•',
    // spacing
    ' ', '\n', '\t',
    // general symbols
    '~', '|', '$', '*', '^', '#', '%', '/', '\\', '!', '?',
    '+', '=', '<', '>', '-', '_', '.', ',', ':', ';',
    // arabic digits
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
    // quotes
    '"', '\'', '‘', '’', '“', '”', '«', '»', '‹', '›', '`',
    // brackets
    '(', ')', '[', ']', '{', '}',
];

/// Allowed symbols that carry no meaning as a word of their own.
pub const STANDALONE_AVOIDED: &[char] = &[
    '~', '|', '$', '*', '^', '#', '\\', '_', '=', '+', '<', '>', '`', '•', '{', '}',
];

/// Ethiopic letters that are too rare in the corpora to train on and have
/// no common substitute.
pub const AVOIDED_LETTERS: &[u32] = &[
    0x1247, 0x124A, 0x124C, 0x124D, 0x1250, 0x1251, 0x1252, 0x1253,
    0x1254, 0x1255, 0x1256, 0x1258, 0x125A, 0x125B, 0x125C, 0x125D,
    0x1287, 0x128A, 0x128C, 0x128D, 0x12AF, 0x12B2, 0x12B4, 0x12B5,
    0x12C2, 0x12C4, 0x12C5, 0x12CF, 0x12EF, 0x12F8, 0x12F9, 0x12FA,
    0x12FB, 0x12FC, 0x12FD, 0x12FE, 0x12FF, 0x130F, 0x1312, 0x1314,
    0x1315, 0x1318, 0x1319, 0x131A, 0x131B, 0x131C, 0x131D, 0x131E,
    0x131F, 0x1347, 0x1358, 0x1359, 0x135A,
];

/// Characters that never form meaningful content between two enclosure
/// glyphs.
pub const ENCLOSURE_JUNK: &[char] = &[
    '-', '[', '’', '|', '\\', '−', '«', ':', '_', '–', '^', '፨', '።', '—', '፦',
    '"', '“', ',', '*', '`', ';', '፡', '፧', '=', '…', '$', '፤', '%', '•', '{',
    '?', '›', '፥', '<', '!', ' ', '\t', '~', '”', ']', '>', '}', '‘', '፣', '/',
    '፠', '‹', '+', '.', '\'', '#', '»',
];

/// Closing glyphs that may directly follow a full stop.
pub const SENTENCE_END_ENCLOSURES: &[char] =
    &[')', ']', '}', '’', '”', '›', '»', '>', '`', '"', '\'', '/'];

/// Characters stripped from line start and end.
pub const EDGE_STRIPPABLE: &[char] = &[
    '$', '/', '<', '‘', '~', ':', '^', '\'', '\t', '’', '«', '>', '›', ' ', '(',
    '|', '?', ';', '-', ']', '_', '−', '{', '\n', '“', '=', ')', '•', '`', ',',
    '[', '—', '»', '…', '*', '#', '\\', '"', '–', '.', '}', '+', '%', '‹', '!',
    '”',
];

/// Brackets kept before an Ethiopic/numeric anchor at line start.
pub const KEEP_START_BRACKETS: &[char] = &['(', '[', '/'];
/// Quotes kept before an Ethiopic/numeric anchor at line start.
pub const KEEP_START_QUOTES: &[char] = &['“', '«', '‹', '"', '\''];
/// Brackets kept after an Ethiopic/numeric anchor at line end.
pub const KEEP_END_BRACKETS: &[char] = &[')', ']', '/'];
/// Quotes kept after an Ethiopic/numeric anchor at line end.
pub const KEEP_END_QUOTES: &[char] = &['”', '»', '›', '"', '\''];

/// Lines repeated so often in some sources that they are dropped outright.
pub const KNOWN_JUNK_LINES: &[&str] = &["ሰለ እዚህ ዜና ዋርካ ስር በአማርኛ ይወያዩ !"];

/// Classifies a code point.
pub fn classify(c: char) -> CharClass {
    let code = c as u32;
    if ETHIOPIC_MARKS.contains(&code) {
        CharClass::EthiopicMark
    } else if ETHIOPIC_PUNCTUATION_RANGE.contains(&code) {
        CharClass::EthiopicPunctuation
    } else if ETHIOPIC_NUMBERS.contains(&code) {
        CharClass::EthiopicNumber
    } else if ETHIOPIC_LETTERS.contains(&code) && is_assigned_letter(code) {
        CharClass::EthiopicLetter
    } else if ALLOWED_NON_ETHIOPIC.contains(&c) {
        CharClass::AllowedSymbol
    } else {
        CharClass::Disallowed
    }
}

/// Unassigned holes inside the Ethiopic syllable range.
fn is_assigned_letter(code: u32) -> bool {
    !matches!(
        code,
        0x1249 | 0x124E | 0x124F | 0x1257 | 0x1259 | 0x125E | 0x125F | 0x1289 | 0x128E
            | 0x128F | 0x12B1 | 0x12B6 | 0x12B7 | 0x12BF | 0x12C1 | 0x12C6 | 0x12C7
            | 0x12D7 | 0x1311 | 0x1316 | 0x1317
    )
}

/// Ethiopic block character other than a combining mark.
pub fn is_ethiopic(c: char) -> bool {
    let code = c as u32;
    ETHIOPIC_RANGE.contains(&code) && !ETHIOPIC_MARKS.contains(&code)
}

pub fn is_ethiopic_punctuation(c: char) -> bool {
    ETHIOPIC_PUNCTUATION_RANGE.contains(&(c as u32))
}

pub fn is_allowed_non_ethiopic(c: char) -> bool {
    ALLOWED_NON_ETHIOPIC.contains(&c)
}

/// Ethiopic character on the rare-letter blacklist, or a combining mark.
pub fn is_avoided(c: char) -> bool {
    let code = c as u32;
    AVOIDED_LETTERS.contains(&code) || ETHIOPIC_MARKS.contains(&code)
}

pub fn is_standalone_avoided(c: char) -> bool {
    STANDALONE_AVOIDED.contains(&c)
}

pub fn is_enclosure_junk(c: char) -> bool {
    ENCLOSURE_JUNK.contains(&c)
}

pub fn is_edge_strippable(c: char) -> bool {
    EDGE_STRIPPABLE.contains(&c)
}

/// Builds a regex character class matching exactly the given characters.
pub(crate) fn regex_class(chars: &[char]) -> String {
    let mut class = String::with_capacity(chars.len() * 8 + 2);
    class.push('[');
    for c in chars {
        class.push_str(&format!("\\x{{{:X}}}", *c as u32));
    }
    class.push(']');
    class
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_ethiopic() {
        assert_eq!(classify('ሀ'), CharClass::EthiopicLetter);
        assert_eq!(classify('ፚ'), CharClass::EthiopicLetter);
        assert_eq!(classify('\u{135F}'), CharClass::EthiopicMark);
        assert_eq!(classify('።'), CharClass::EthiopicPunctuation);
        assert_eq!(classify('፩'), CharClass::EthiopicNumber);
        assert_eq!(classify('፼'), CharClass::EthiopicNumber);
    }

    #[test]
    fn test_classify_non_ethiopic() {
        assert_eq!(classify('!'), CharClass::AllowedSymbol);
        assert_eq!(classify('7'), CharClass::AllowedSymbol);
        assert_eq!(classify('«'), CharClass::AllowedSymbol);
        assert_eq!(classify('@'), CharClass::Disallowed);
        assert_eq!(classify('a'), CharClass::Disallowed);
        assert_eq!(classify('\u{1249}'), CharClass::Disallowed);
        assert_eq!(classify('\u{137D}'), CharClass::Disallowed);
    }

    #[test]
    fn test_classes_are_disjoint_from_marks() {
        for code in ETHIOPIC_MARKS {
            let c = char::from_u32(code).unwrap();
            assert!(!classify(c).is_kept());
            assert!(!is_ethiopic(c));
            assert!(is_avoided(c));
        }
    }

    #[test]
    fn test_avoided_letters_are_ethiopic() {
        for code in AVOIDED_LETTERS {
            assert!(ETHIOPIC_LETTERS.contains(code));
        }
    }

    #[test]
    fn test_regex_class_matches_listed_chars() {
        let re = regex::Regex::new(&format!("^{}+$", regex_class(ENCLOSURE_JUNK))).unwrap();
        let all: String = ENCLOSURE_JUNK.iter().collect();
        assert!(re.is_match(&all));
        assert!(!re.is_match("ሀ"));
        assert!(!re.is_match("("));
    }
}
