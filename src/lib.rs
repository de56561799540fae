//! # ethprep
//!
//! Cleaning and assembly of Amharic/Ethiopic text corpora into OCR
//! training text.
//!
//! ## Pipeline
//!
//! Every raw line passes through six stages:
//!
//! - **Character filter**: keep Ethiopic script and a short allow-list of symbols
//! - **Frequency reducer**: demote rare letters, cap over-represented words
//! - **Punctuation normalizer**: repair mis-typed Ethiopic punctuation and spacing
//! - **Enclosure janitor**: drop brackets and quotes that wrap only junk
//! - **Edge trimmer**: strip list and table remnants from the line ends
//! - **Line filter**: reject lines without Ethiopic content
//!
//! ## Quick Start
//!
//! ```
//! use ethprep::{FrequencyTable, LineOutcome, Pipeline};
//!
//! fn main() -> ethprep::Result<()> {
//!     let pipeline = Pipeline::default();
//!     // One table per subgroup
//!     let mut table = FrequencyTable::new(5);
//!
//!     let outcome = pipeline.clean_line("ሰላም፡፡እንደምን", &mut table)?;
//!     assert_eq!(outcome, LineOutcome::Kept("ሰላም። እንደምን".to_string()));
//!     Ok(())
//! }
//! ```
//!
//! Whole corpora are cleaned with [`corpus::clean_corpus`], combined into
//! training text with the [`combine`] functions and summarized with
//! [`stats::collect_stats`].

pub mod charset;
pub mod clean;
pub mod combine;
pub mod corpus;
pub mod error;
pub mod stats;
pub mod subgroup;

// Re-exports
pub use charset::{classify, CharClass};
pub use clean::{
    clean_line, DiscardReason, EnclosureTable, FrequencyTable, LineOutcome, Pipeline,
    PipelineOptions, Stage,
};
pub use combine::{CombineMode, CombineOptions, CombineReport, LINE_LENGTH};
pub use corpus::{clean_corpus, CorpusOptions, CorpusReport};
pub use error::{Error, Result};
pub use stats::{collect_stats, CorpusStats};
pub use subgroup::{Subgroup, SubgroupSet};
