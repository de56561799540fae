//! Stage 4: Enclosure Janitor
//!
//! Removes junk left between bracket and quote pairs, typically the remains
//! of foreign-script annotations deleted by the character filter.

use super::Stage;
use crate::charset::{regex_class, ENCLOSURE_JUNK};
use crate::error::{Error, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Enclosure pairs in priority order.
pub const ENCLOSURE_PAIRS: &[(char, char)] = &[
    ('(', ')'),
    ('[', ']'),
    ('{', '}'),
    ('‘', '’'),
    ('“', '”'),
    ('‹', '›'),
    ('<', '>'),
    ('`', '`'),
    ('"', '"'),
    ('\'', '\''),
    ('/', '/'),
    ('|', '|'),
];

static DEFAULT_TABLE: LazyLock<EnclosureTable> =
    LazyLock::new(|| EnclosureTable::from_pairs(ENCLOSURE_PAIRS).unwrap());

/// One enclosure record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnclosurePair {
    pub start: char,
    pub end: char,
    /// Start and end are the same glyph (`/`, `"`, `|`, ...).
    pub same_glyph: bool,
}

impl EnclosurePair {
    /// Text that replaces a junk match.
    ///
    /// A non-space neighbour is always kept. For same-glyph pairs anchored
    /// to preceding text, the glyphs are kept with their neighbours so two
    /// separately delimited spans are never fused. The fragments are joined
    /// by one space.
    fn replacement(&self, prefix: Option<char>, suffix: Option<char>) -> String {
        let prefix = prefix.filter(|c| !c.is_whitespace());
        let suffix = suffix.filter(|c| !c.is_whitespace());
        let anchored = self.same_glyph && prefix.is_some();

        let mut result = String::with_capacity(8);
        if let Some(p) = prefix {
            result.push(p);
            if anchored {
                result.push(self.start);
            }
        }
        result.push(' ');
        if let Some(s) = suffix {
            if anchored {
                result.push(self.end);
            }
            result.push(s);
        }
        result
    }
}

/// Mapping from start glyph to its enclosure record, with one compiled
/// junk pattern per pair.
#[derive(Debug, Clone)]
pub struct EnclosureTable {
    pairs: HashMap<char, EnclosurePair>,
    patterns: Vec<(char, Regex)>,
}

impl EnclosureTable {
    /// Builds a table from `(start, end)` pairs given in priority order.
    ///
    /// Start glyphs must be unique, and so must end glyphs.
    pub fn from_pairs(pairs: &[(char, char)]) -> Result<Self> {
        let junk = regex_class(ENCLOSURE_JUNK);
        let mut map = HashMap::with_capacity(pairs.len());
        let mut patterns = Vec::with_capacity(pairs.len());

        for &(start, end) in pairs {
            if map.values().any(|p: &EnclosurePair| p.end == end) {
                return Err(Error::MalformedEnclosure(format!(
                    "end glyph {end:?} is used by more than one pair"
                )));
            }
            let pair = EnclosurePair {
                start,
                end,
                same_glyph: start == end,
            };
            if map.insert(start, pair).is_some() {
                return Err(Error::MalformedEnclosure(format!(
                    "start glyph {start:?} is listed twice"
                )));
            }

            let pattern = format!(
                r"(?s:(.))?{}{}*{}(?s:(.))?",
                regex_class(&[start]),
                junk,
                regex_class(&[end])
            );
            let regex = Regex::new(&pattern)
                .map_err(|e| Error::MalformedEnclosure(format!("{start:?}: {e}")))?;
            patterns.push((start, regex));
        }

        Ok(Self {
            pairs: map,
            patterns,
        })
    }

    /// Looks up the record for a start glyph.
    pub fn lookup(&self, start: char) -> Result<&EnclosurePair> {
        self.pairs.get(&start).ok_or_else(|| {
            Error::MalformedEnclosure(format!("no enclosure starts with {start:?}"))
        })
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    fn clean_with(&self, line: &str, regex: &Regex) -> Result<String> {
        let mut result = String::with_capacity(line.len());
        let mut last = 0;

        for caps in regex.captures_iter(line) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let prefix = caps.get(1).map(|m| m.as_str());
            let suffix = caps.get(2).map(|m| m.as_str());

            // glyphs as actually matched, with the optional neighbours cut off
            let body = &whole.as_str()[prefix.map_or(0, str::len)..];
            let body = &body[..body.len() - suffix.map_or(0, str::len)];
            let (Some(start), Some(end)) = (body.chars().next(), body.chars().last()) else {
                return Err(Error::invariant(
                    Stage::EnclosureJanitor,
                    format!("empty enclosure match in {line:?}"),
                ));
            };

            let pair = self.lookup(start)?;
            if pair.end != end {
                return Err(Error::MalformedEnclosure(format!(
                    "{start:?} matched with end {end:?}, expected {:?}",
                    pair.end
                )));
            }

            result.push_str(&line[last..whole.start()]);
            result.push_str(&pair.replacement(
                prefix.and_then(|s| s.chars().next()),
                suffix.and_then(|s| s.chars().next()),
            ));
            last = whole.end();
        }

        result.push_str(&line[last..]);
        Ok(result)
    }

    /// Runs every enclosure pattern once, in priority order.
    ///
    /// A space is appended to a line not ending in whitespace so a match
    /// always has room for its trailing neighbour.
    pub fn clean(&self, line: &str) -> Result<String> {
        let mut line = line.to_string();
        if line.chars().last().is_some_and(|c| !c.is_whitespace()) {
            line.push(' ');
        }
        for (_, regex) in &self.patterns {
            line = self.clean_with(&line, regex)?;
        }
        Ok(line)
    }

    /// Repeats [`clean`](Self::clean) until the line stops changing or
    /// `max_passes` is reached.
    pub fn clean_converging(&self, line: &str, max_passes: usize) -> Result<String> {
        let mut current = self.clean(line)?;
        for _ in 1..max_passes {
            let next = self.clean(&current)?;
            if next == current {
                break;
            }
            current = next;
        }
        Ok(current)
    }
}

impl Default for EnclosureTable {
    fn default() -> Self {
        DEFAULT_TABLE.clone()
    }
}

/// Stage 4: remove junk between enclosures with the default table, single pass.
pub fn clean_enclosures(line: &str) -> Result<String> {
    DEFAULT_TABLE.clean(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(line: &str) -> String {
        clean_enclosures(line).unwrap()
    }

    fn squeeze(line: &str) -> String {
        line.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_default_table() {
        let table = EnclosureTable::default();
        assert_eq!(table.len(), 12);
        assert!(!table.lookup('(').unwrap().same_glyph);
        assert!(table.lookup('/').unwrap().same_glyph);
        assert_eq!(table.lookup('“').unwrap().end, '”');
    }

    #[test]
    fn test_malformed_tables_rejected() {
        let err = EnclosureTable::from_pairs(&[('(', ')'), ('(', ']')]).unwrap_err();
        assert!(matches!(err, Error::MalformedEnclosure(_)));
        let err = EnclosureTable::from_pairs(&[('(', ')'), ('[', ')')]).unwrap_err();
        assert!(matches!(err, Error::MalformedEnclosure(_)));
        assert!(EnclosureTable::default().lookup('«').is_err());
    }

    #[test]
    fn test_appends_trailing_space() {
        assert_eq!(clean("ሰላም"), "ሰላም ");
        assert_eq!(clean("ሰላም "), "ሰላም ");
        assert_eq!(clean(""), "");
    }

    #[test]
    fn test_quoted_junk_before_word() {
        assert_eq!(clean("\"***\"word"), " word ");
        assert_eq!(squeeze(&clean("\"***\"ቃል")), "ቃል");
    }

    #[test]
    fn test_distinct_pair_keeps_neighbours_without_glyphs() {
        assert_eq!(clean("ሀ(**)ለ"), "ሀ ለ ");
        assert_eq!(squeeze(&clean("ሀ ( - ) ለ")), "ሀ ለ");
        assert_eq!(squeeze(&clean("ቃል [? ?] ሌላ")), "ቃል ሌላ");
    }

    #[test]
    fn test_meaningful_enclosures_untouched() {
        assert_eq!(clean("(ሰላም) «ቃል»"), "(ሰላም) «ቃል» ");
        assert_eq!(clean("“ሰላም።” አለ"), "“ሰላም።” አለ ");
    }

    #[test]
    fn test_same_glyph_spans_not_fused() {
        assert_eq!(clean("/ማየት/, / . ^/'/እዩት/"), "/ማየት/ /እዩት/ ");
    }

    #[test]
    fn test_same_glyph_adjacent_content_preserved() {
        assert_eq!(clean("/ቃል1/ X /ቃል2/"), "/ቃል1/ X /ቃል2/ ");
        assert_eq!(squeeze(&clean("/ቃል/ .. / ሌላ")), "/ቃል/ ሌላ");
    }

    #[test]
    fn test_single_pass_leaves_nested_junk() {
        let table = EnclosureTable::default();
        let once = table.clean("ሀ ( ( ) ) ለ").unwrap();
        assert_eq!(squeeze(&once), "ሀ ( ) ለ");
        let converged = table.clean_converging("ሀ ( ( ) ) ለ", 4).unwrap();
        assert_eq!(squeeze(&converged), "ሀ ለ");
    }

    #[test]
    fn test_converges_within_two_passes() {
        let table = EnclosureTable::default();
        for line in ["ሀ ( ( ) ) ለ", "ቃል “ ” (ሌላ)", "/ማየት/, / . ^/'/እዩት/"] {
            let twice = table.clean(&table.clean(line).unwrap()).unwrap();
            let thrice = table.clean(&twice).unwrap();
            assert_eq!(twice, thrice, "not converged for {line:?}");
        }
    }
}
