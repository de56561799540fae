//! Stage 3: Punctuation Normalizer
//!
//! Repairs mis-transcribed Ethiopic punctuation and enforces spacing around
//! punctuation marks.

use super::Stage;
use crate::charset::{is_enclosure_junk, SENTENCE_END_ENCLOSURES};
use crate::error::{Error, Result};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Separators trimmed from the line ends before normalization.
const LEADING_TRAILING_SEPARATORS: &[char] = &['+', '|', ',', ' ', '\t', '\n', '\r'];

/// Two-character sequences and their correct form.
const PUNCTUATION_FIXES: &[(&str, &str)] = &[
    // doubled word-space mark -> full stop
    ("፡፡", "።"),
    // word-space + hyphen -> preface colon
    ("፡-", "፦"),
    // semicolon + hyphen
    ("፤-", "፤ "),
];

/// Characters followed by a space unless a closing bracket comes next.
const SPACE_AFTER: &[char] = &['፣', '፦', '፥', '፧', '፡', '፤', '፠', '።', '፨', ';'];

/// Characters that repeat in table-of-contents leaders.
const REPEATING: &[char] = &['.', '…', '_'];

static RE_MISWRITTEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"፡፡|፡-|፤-").unwrap());

static RE_REPEATED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".?(?:[._]{4,}|…{2,}).?").unwrap());

// Dictionary entries of the form `word(alternative)`
static RE_GLUED_PAREN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\x{1200}-\x{135A}]{2,})(\([^)]{3,})").unwrap());

/// Returns the replacement for a mis-written punctuation pair.
pub(crate) fn fix_miswritten(pair: &str) -> Result<&'static str> {
    let len = pair.chars().count();
    if len != 2 {
        return Err(Error::invariant(
            Stage::PunctuationNormalizer,
            format!("expected a 2-character match, got {len} in {pair:?}"),
        ));
    }
    PUNCTUATION_FIXES
        .iter()
        .find(|(wrong, _)| *wrong == pair)
        .map(|(_, right)| *right)
        .ok_or_else(|| {
            Error::invariant(
                Stage::PunctuationNormalizer,
                format!("no punctuation fix for {pair:?}"),
            )
        })
}

/// Substitutes mis-written two-character punctuation.
pub fn substitute_punctuation(line: &str) -> Result<String> {
    let mut result = String::with_capacity(line.len());
    let mut last = 0;
    for m in RE_MISWRITTEN.find_iter(line) {
        result.push_str(&line[last..m.start()]);
        result.push_str(fix_miswritten(m.as_str())?);
        last = m.end();
    }
    result.push_str(&line[last..]);
    Ok(result)
}

fn needs_space(first: char, second: char) -> bool {
    (SPACE_AFTER.contains(&first) && !second.is_whitespace() && second != ')' && second != ']')
        || (first == ']' && second == '[')
        || (first == ')' && second == '(')
}

/// Separator to put between a matched pair.
pub(crate) fn pair_separator(first: char, second: char) -> Result<&'static str> {
    if !SPACE_AFTER.contains(&first) && first != ']' && first != ')' {
        return Err(Error::invariant(
            Stage::PunctuationNormalizer,
            format!("unexpected {first:?} at start of spacing match"),
        ));
    }
    // a closing glyph after a full stop already ends the sentence
    if first == '።' && SENTENCE_END_ENCLOSURES.contains(&second) {
        return Ok("");
    }
    Ok(" ")
}

/// Inserts a space after punctuation and between `][` and `)(`.
///
/// The second character of a pair may start the next pair, so runs of
/// marks such as `፣።` are spaced throughout.
pub fn add_missing_spaces(line: &str) -> Result<String> {
    let mut result = String::with_capacity(line.len() + 8);
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        result.push(c);
        if let Some(&next) = chars.peek() {
            if needs_space(c, next) {
                result.push_str(pair_separator(c, next)?);
            }
        }
    }
    Ok(result)
}

fn collapse_run(caps: &Captures) -> String {
    let run: Vec<char> = caps[0].chars().collect();
    let (start, punc, end) = (run[0], run[1], run[run.len() - 1]);

    let mut result = String::new();
    if !REPEATING.contains(&start) {
        result.push(start);
        if !start.is_whitespace() {
            result.push(' ');
        }
    }
    if punc == '…' {
        result.push(punc);
    } else {
        result.extend([punc; 3]);
    }
    if !REPEATING.contains(&end) {
        if !end.is_whitespace() {
            result.push(' ');
        }
        result.push(end);
    }
    result
}

/// Collapses runs of 4+ `.`/`_` to three and 2+ `…` to one, keeping the
/// run apart from neighbouring words.
pub fn collapse_repeated(line: &str) -> String {
    RE_REPEATED.replace_all(line, collapse_run).into_owned()
}

/// Separates a word from a directly attached parenthesized alternative.
pub fn space_before_paren(line: &str) -> String {
    RE_GLUED_PAREN
        .replace_all(line, |caps: &Captures| {
            let group = &caps[2];
            let looks_empty = group[1..]
                .chars()
                .all(|c| c.is_whitespace() || is_enclosure_junk(c));
            if looks_empty {
                caps[0].to_string()
            } else {
                format!("{} {}", &caps[1], group)
            }
        })
        .into_owned()
}

/// Stage 3: normalize punctuation.
pub fn normalize_punctuation(line: &str) -> Result<String> {
    let line = line.trim_matches(LEADING_TRAILING_SEPARATORS);
    let line = substitute_punctuation(line)?;
    let line = add_missing_spaces(&line)?;
    let line = collapse_repeated(&line);
    Ok(space_before_paren(&line))
}
