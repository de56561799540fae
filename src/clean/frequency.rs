//! Stage 2: Frequency Reducer
//!
//! Demotes rare Ethiopic characters, drops words that cannot be used for
//! training and caps how often a word may appear within one subgroup.

use crate::charset::{classify, is_avoided, is_standalone_avoided, CharClass, ETHIOPIC_MARKS};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Rare characters and their common substitutes.
const SUBSTITUTIONS: &[(char, char)] = &[
    ('ጕ', 'ጉ'),
    ('ኵ', 'ኩ'),
    ('ዅ', 'ኹ'),
    ('ኍ', 'ኁ'),
    ('፧', '?'),
    ('፠', ' '),
    ('፨', ' '),
];

/// Characters stripped from both ends of a word to form its frequency key.
const FREQUENCY_KEY_STRIP: &[char] = &[
    '፡', '።', '፣', '፤', '፥', '፦', '.', ',', ';', ':', '!', '?', '(', ')', '[', ']', '{', '}',
    '"', '\'', '«', '»', '‹', '›', '“', '”', '‘', '’', '-', '/', '…',
];

static RE_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").unwrap());

// Leftovers of numeric HTML entities in the web corpus
static RE_ENTITY_RESIDUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]{3};").unwrap());

static RE_ABBREVIATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{1200}-\x{135A}]+/[\x{1200}-\x{135A}]+").unwrap());

static RE_NUMERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:ለ|ክ|በ|የ)?[\x{1369}-\x{137C}0-9]+").unwrap());

/// Shape of a word, deciding how much one occurrence weighs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordShape {
    /// One character.
    SingleChar,
    /// Letters separated by a slash, e.g. `ዓ/ም`.
    Abbreviation,
    /// Arabic or Ethiopic number, optionally with a letter prefix.
    Numeral,
    /// Everything else.
    Regular,
}

impl WordShape {
    /// Determines the shape of a frequency key.
    pub fn of(key: &str) -> Self {
        if key.chars().count() == 1 {
            WordShape::SingleChar
        } else if RE_ABBREVIATION.is_match(key) {
            WordShape::Abbreviation
        } else if RE_NUMERAL.is_match(key) {
            WordShape::Numeral
        } else {
            WordShape::Regular
        }
    }

    /// Count added per occurrence.
    pub fn weight(self) -> u32 {
        match self {
            WordShape::SingleChar => 2,
            WordShape::Abbreviation | WordShape::Numeral => 4,
            WordShape::Regular => 1,
        }
    }
}

/// Word counts for one subgroup pass.
///
/// Owned by the caller: create one at the start of a subgroup, drop it at
/// the end. Not meant to be shared between concurrent writers.
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    cap: Option<u32>,
    counts: HashMap<String, u32>,
}

impl FrequencyTable {
    /// Creates a table that drops a word once its weighted count reaches `cap`.
    pub fn new(cap: u32) -> Self {
        Self {
            cap: Some(cap),
            counts: HashMap::new(),
        }
    }

    /// Creates a table that never drops words.
    pub fn uncapped() -> Self {
        Self::default()
    }

    pub fn cap(&self) -> Option<u32> {
        self.cap
    }

    /// Current weighted count for a word (looked up by its key).
    pub fn count(&self, word: &str) -> u32 {
        self.counts.get(frequency_key(word)).copied().unwrap_or(0)
    }

    /// Number of distinct keys seen.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Records one occurrence of `word`; returns whether it is kept.
    pub fn admit(&mut self, word: &str) -> bool {
        let Some(cap) = self.cap else {
            return true;
        };
        let key = frequency_key(word);
        if key.is_empty() {
            return true;
        }
        let weight = WordShape::of(key).weight();
        let count = self.counts.entry(key.to_string()).or_insert(0);
        *count = count.saturating_add(weight);
        *count < cap
    }
}

/// Word with surrounding punctuation removed.
pub fn frequency_key(word: &str) -> &str {
    word.trim_matches(|c: char| FREQUENCY_KEY_STRIP.contains(&c))
}

/// Substitutes a rare character, folds dashes and drops combining marks.
fn demote_char(c: char) -> Option<char> {
    if ETHIOPIC_MARKS.contains(&(c as u32)) {
        return None;
    }
    if matches!(c, '−' | '–' | '—') {
        return Some('-');
    }
    Some(
        SUBSTITUTIONS
            .iter()
            .find(|(rare, _)| *rare == c)
            .map_or(c, |(_, common)| *common),
    )
}

fn is_usable(c: char, extra_allowed: &[char]) -> bool {
    match classify(c) {
        CharClass::EthiopicLetter => !is_avoided(c),
        CharClass::EthiopicPunctuation | CharClass::EthiopicNumber | CharClass::AllowedSymbol => {
            true
        }
        CharClass::EthiopicMark | CharClass::Disallowed => extra_allowed.contains(&c),
    }
}

/// Returns true if the word has a character with no place in training text.
fn has_unusable_char(word: &str, extra_allowed: &[char]) -> bool {
    word.chars().any(|c| !is_usable(c, extra_allowed))
}

fn reduce_word(word: &str, table: &mut FrequencyTable, extra_allowed: &[char]) -> String {
    if word.chars().all(is_standalone_avoided) || has_unusable_char(word, extra_allowed) {
        return String::new();
    }

    let word = RE_ENTITY_RESIDUE.replace_all(word, "");
    if word.is_empty() || !table.admit(&word) {
        return String::new();
    }
    word.into_owned()
}

/// Stage 2: reduce rare characters and over-represented words.
///
/// Dropped words leave their surrounding whitespace in place.
pub fn reduce_frequency(line: &str, table: &mut FrequencyTable) -> String {
    reduce_frequency_with(line, table, &[])
}

/// Like [`reduce_frequency`], also accepting `extra_allowed` characters in
/// kept words. Pass the same characters the character filter keeps.
pub fn reduce_frequency_with(
    line: &str,
    table: &mut FrequencyTable,
    extra_allowed: &[char],
) -> String {
    let demoted: String = line.chars().filter_map(demote_char).collect();
    RE_WORD
        .replace_all(&demoted, |caps: &Captures| {
            reduce_word(&caps[0], table, extra_allowed)
        })
        .into_owned()
}
