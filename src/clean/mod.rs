//! Six-stage line cleaning pipeline.
//!
//! Each raw line passes through the stages in order:
//!
//! 1. [`filter`]: drop characters outside the allow-list
//! 2. [`frequency`]: demote rare letters, drop unusable and over-represented words
//! 3. [`punctuation`]: repair and space punctuation
//! 4. [`enclosure`]: remove brackets and quotes wrapping nothing but junk
//! 5. [`trim`]: strip list and table remnants from the line ends
//! 6. [`line_filter`]: reject lines without Ethiopic content
//!
//! A line may be discarded after any stage. Every stage is also exposed as
//! a free function for callers that need only part of the pipeline.

pub mod enclosure;
pub mod filter;
pub mod frequency;
pub mod line_filter;
pub mod punctuation;
pub mod trim;

pub use enclosure::{clean_enclosures, EnclosurePair, EnclosureTable};
pub use filter::{filter_chars, CharFilter};
pub use frequency::{reduce_frequency, reduce_frequency_with, FrequencyTable, WordShape};
pub use line_filter::keep_line;
pub use punctuation::normalize_punctuation;
pub use trim::trim_edges;

use crate::error::Result;
use line_filter::Rejection;
use std::fmt;

/// Default bound on janitor passes when convergence is enabled.
pub const DEFAULT_MAX_ENCLOSURE_PASSES: usize = 4;

/// A pipeline stage, used in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    CharacterFilter,
    FrequencyReducer,
    PunctuationNormalizer,
    EnclosureJanitor,
    EdgeTrimmer,
    LineFilter,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::CharacterFilter => "character filter",
            Stage::FrequencyReducer => "frequency reducer",
            Stage::PunctuationNormalizer => "punctuation normalizer",
            Stage::EnclosureJanitor => "enclosure janitor",
            Stage::EdgeTrimmer => "edge trimmer",
            Stage::LineFilter => "line filter",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a line produced no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscardReason {
    /// Nothing but whitespace was left after the stage.
    Emptied(Stage),
    /// Only symbols and Ethiopic punctuation remained.
    NoEthiopicContent,
    /// The line is one of the known repeated junk lines.
    KnownJunk,
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscardReason::Emptied(stage) => write!(f, "emptied by {stage}"),
            DiscardReason::NoEthiopicContent => f.write_str("no Ethiopic content"),
            DiscardReason::KnownJunk => f.write_str("known junk line"),
        }
    }
}

/// Terminal state of one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Kept(String),
    Discarded(DiscardReason),
}

impl LineOutcome {
    pub fn is_kept(&self) -> bool {
        matches!(self, LineOutcome::Kept(_))
    }

    /// The cleaned line, if it was kept.
    pub fn kept(&self) -> Option<&str> {
        match self {
            LineOutcome::Kept(line) => Some(line),
            LineOutcome::Discarded(_) => None,
        }
    }
}

/// Options for the cleaning pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Repeat the enclosure janitor until the line stops changing.
    /// Default: false (one pass)
    pub converge_enclosures: bool,

    /// Upper bound on janitor passes when converging.
    pub max_enclosure_passes: usize,

    /// Characters the character filter keeps on top of the default classes.
    pub extra_allowed: Vec<char>,

    /// Characters turned into spaces before any stage runs.
    ///
    /// Some sources use e.g. `*` as a field separator.
    pub replace_with_space: Vec<char>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            converge_enclosures: false,
            max_enclosure_passes: DEFAULT_MAX_ENCLOSURE_PASSES,
            extra_allowed: Vec::new(),
            replace_with_space: Vec::new(),
        }
    }
}

impl PipelineOptions {
    /// Creates new options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterates the enclosure janitor to a fixed point, at most `max_passes` times.
    pub fn with_enclosure_convergence(mut self, max_passes: usize) -> Self {
        self.converge_enclosures = true;
        self.max_enclosure_passes = max_passes.max(1);
        self
    }

    /// Keeps additional characters through the character filter.
    pub fn with_extra_allowed(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.extra_allowed.extend(chars);
        self
    }

    /// Replaces the given characters with spaces before cleaning.
    pub fn with_replace_with_space(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.replace_with_space.extend(chars);
        self
    }
}

/// The full six-stage pipeline.
///
/// Holds only immutable configuration; the frequency table is passed to
/// every call so its owner decides when counting starts and stops.
#[derive(Debug, Clone)]
pub struct Pipeline {
    options: PipelineOptions,
    filter: CharFilter,
    enclosures: EnclosureTable,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineOptions::default())
    }
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self::with_enclosures(options, EnclosureTable::default())
    }

    /// Creates a pipeline with a custom enclosure table.
    pub fn with_enclosures(options: PipelineOptions, enclosures: EnclosureTable) -> Self {
        let filter = CharFilter::new().with_extra_allowed(options.extra_allowed.iter().copied());
        Self {
            options,
            filter,
            enclosures,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Cleans one raw line.
    ///
    /// Errors are invariant violations; the caller should abort the unit of
    /// work it is processing rather than skip the line.
    pub fn clean_line(&self, line: &str, table: &mut FrequencyTable) -> Result<LineOutcome> {
        let line = self.replace_separators(line);
        // The edge trimmer would strip the trailing mark, so check the raw line first.
        if line_filter::is_known_junk(&line) {
            return Ok(discard(DiscardReason::KnownJunk));
        }

        let line = self.filter.apply(&line);
        if let Some(outcome) = emptied(&line, Stage::CharacterFilter) {
            return Ok(outcome);
        }

        let line = reduce_frequency_with(&line, table, &self.options.extra_allowed);
        if let Some(outcome) = emptied(&line, Stage::FrequencyReducer) {
            return Ok(outcome);
        }

        let line = normalize_punctuation(&line)?;
        if let Some(outcome) = emptied(&line, Stage::PunctuationNormalizer) {
            return Ok(outcome);
        }

        let line = if self.options.converge_enclosures {
            self.enclosures
                .clean_converging(&line, self.options.max_enclosure_passes)?
        } else {
            self.enclosures.clean(&line)?
        };
        if let Some(outcome) = emptied(&line, Stage::EnclosureJanitor) {
            return Ok(outcome);
        }

        let line = trim_edges(&line)?;
        if let Some(outcome) = emptied(&line, Stage::EdgeTrimmer) {
            return Ok(outcome);
        }

        Ok(match line_filter::rejection(&line) {
            None => LineOutcome::Kept(line),
            Some(Rejection::Empty) => discard(DiscardReason::Emptied(Stage::LineFilter)),
            Some(Rejection::NoEthiopicContent) => discard(DiscardReason::NoEthiopicContent),
            Some(Rejection::KnownJunk) => discard(DiscardReason::KnownJunk),
        })
    }

    fn replace_separators(&self, line: &str) -> String {
        if self.options.replace_with_space.is_empty() {
            return line.to_string();
        }
        line.chars()
            .map(|c| {
                if self.options.replace_with_space.contains(&c) {
                    ' '
                } else {
                    c
                }
            })
            .collect()
    }
}

fn discard(reason: DiscardReason) -> LineOutcome {
    tracing::trace!(%reason, "line discarded");
    LineOutcome::Discarded(reason)
}

fn emptied(line: &str, stage: Stage) -> Option<LineOutcome> {
    line.trim()
        .is_empty()
        .then(|| discard(DiscardReason::Emptied(stage)))
}

/// Cleans one line with the default pipeline.
pub fn clean_line(line: &str, table: &mut FrequencyTable) -> Result<LineOutcome> {
    Pipeline::default().clean_line(line, table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(line: &str) -> LineOutcome {
        Pipeline::default()
            .clean_line(line, &mut FrequencyTable::uncapped())
            .unwrap()
    }

    fn kept(line: &str) -> String {
        match clean(line) {
            LineOutcome::Kept(cleaned) => cleaned,
            other => panic!("{line:?} was not kept: {other:?}"),
        }
    }

    #[test]
    fn test_pipeline_examples() {
        assert_eq!(kept("ሰላም፡፡እንደምን"), "ሰላም። እንደምን");
        assert_eq!(kept("እሺ....በል"), "እሺ ... በል");
        assert_eq!(kept("\"***\"ቃል"), "ቃል");
        assert_eq!(kept("ሀ(**)ለ"), "ሀ ለ");
        assert_eq!(kept("*** «ሰላም» ***"), "«ሰላም»");
    }

    #[test]
    fn test_second_pass_changes_nothing() {
        let pipeline = Pipeline::default();
        let lines = [
            "ሰላም፡፡እንደምን",
            "እሺ....በል",
            "*** «ሰላም» ***",
            "ሀ(**)ለ",
            "/ማየት/, / . ^/'/እዩት/",
            "ቃል፡-ምሳሌ",
            "ዋጋ 50% ...",
            "ሰላም፣።እንደምን",
            "፡፡፡፡ሀ",
            "ሀ፤፣፥ለ።።",
        ];
        for line in lines {
            let mut table = FrequencyTable::uncapped();
            let first = pipeline.clean_line(line, &mut table).unwrap();
            let first = first.kept().expect("line kept").to_string();
            let second = pipeline.clean_line(&first, &mut table).unwrap();
            assert_eq!(second.kept(), Some(first.as_str()), "input {line:?}");
        }
    }

    #[test]
    fn test_line_rejection() {
        assert!(!clean("... - ( )").is_kept());
        assert!(clean("ሰላም").is_kept());
        assert_eq!(
            clean("ሰለ እዚህ ዜና ዋርካ ስር በአማርኛ ይወያዩ !"),
            LineOutcome::Discarded(DiscardReason::KnownJunk)
        );
        assert_eq!(
            clean("** ~|"),
            LineOutcome::Discarded(DiscardReason::Emptied(Stage::FrequencyReducer))
        );
    }

    #[test]
    fn test_symbol_only_line_has_no_ethiopic_content() {
        assert_eq!(
            clean("1997 - 2001"),
            LineOutcome::Discarded(DiscardReason::NoEthiopicContent)
        );
    }

    #[test]
    fn test_same_glyph_pairs_stay_apart() {
        assert_eq!(kept("/ቃል1/ ሀ /ቃል2/"), "/ቃል1/ ሀ /ቃል2/");
        assert_eq!(kept("/ቃል1/ X /ቃል2/"), "/ቃል1/ /ቃል2/");
    }

    #[test]
    fn test_frequency_cap_keeps_first_occurrences_in_order() {
        let pipeline = Pipeline::default();
        let mut table = FrequencyTable::new(5);
        let outcomes: Vec<_> = (1..=6)
            .map(|i| {
                pipeline
                    .clean_line(&format!("ሰላም ወንድም{i}"), &mut table)
                    .unwrap()
            })
            .collect();

        for (i, outcome) in outcomes.iter().enumerate().take(4) {
            assert_eq!(outcome.kept(), Some(format!("ሰላም ወንድም{}", i + 1).as_str()));
        }
        assert_eq!(outcomes[4].kept(), Some("ወንድም5"));
        assert_eq!(outcomes[5].kept(), Some("ወንድም6"));
        assert_eq!(table.count("ሰላም"), 6);
    }

    #[test]
    fn test_extra_allowed_reaches_frequency_reducer() {
        assert_eq!(kept("ሰላም @world! 123"), "ሰላም ! 123");

        let latin = ('a'..='z').chain('A'..='Z');
        let pipeline = Pipeline::new(PipelineOptions::new().with_extra_allowed(latin));
        let outcome = pipeline
            .clean_line("ሰላም @world! 123", &mut FrequencyTable::uncapped())
            .unwrap();
        assert_eq!(outcome.kept(), Some("ሰላም world! 123"));
    }

    #[test]
    fn test_replace_with_space() {
        let pipeline = Pipeline::new(PipelineOptions::new().with_replace_with_space(['*']));
        let outcome = pipeline
            .clean_line("ሀገር*ቤት", &mut FrequencyTable::uncapped())
            .unwrap();
        assert_eq!(outcome.kept(), Some("ሀገር ቤት"));
    }

    #[test]
    fn test_enclosure_convergence_option() {
        let line = "ሀ ( ( ) ) ለ";
        assert_eq!(kept(line), "ሀ ( ) ለ");

        let pipeline = Pipeline::new(PipelineOptions::new().with_enclosure_convergence(3));
        let outcome = pipeline
            .clean_line(line, &mut FrequencyTable::uncapped())
            .unwrap();
        assert_eq!(outcome.kept(), Some("ሀ ለ"));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::EnclosureJanitor.to_string(), "enclosure janitor");
        assert_eq!(
            DiscardReason::Emptied(Stage::EdgeTrimmer).to_string(),
            "emptied by edge trimmer"
        );
    }
}
