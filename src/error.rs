//! Error types for ethprep library.

use crate::clean::Stage;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ethprep operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ethprep library.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A pattern match broke an assumption the stage relies on.
    ///
    /// This points at a bug in pattern construction rather than bad input,
    /// so processing of the current unit of work is aborted.
    #[error("classification invariant violated in {stage}: {detail}")]
    ClassificationInvariantViolation { stage: Stage, detail: String },

    /// The enclosure table has no record for a glyph that a pattern matched.
    #[error("malformed enclosure table entry: {0}")]
    MalformedEnclosure(String),

    /// Output file exists and overwriting was not requested.
    #[error("output file already exists: {}", .0.display())]
    OutputExists(PathBuf),

    /// Input file or directory does not exist.
    #[error("input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// Invalid configuration (subgroup file, options).
    #[error("configuration error: {0}")]
    Config(String),

    /// An error raised while cleaning a specific input line.
    #[error("{}:{line}: {source}", .path.display())]
    AtLine {
        path: PathBuf,
        line: usize,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn invariant(stage: Stage, detail: impl Into<String>) -> Self {
        Error::ClassificationInvariantViolation {
            stage,
            detail: detail.into(),
        }
    }

    /// Returns true for errors caused by a broken pattern assumption.
    pub fn is_invariant_violation(&self) -> bool {
        match self {
            Error::ClassificationInvariantViolation { .. } | Error::MalformedEnclosure(_) => true,
            Error::AtLine { source, .. } => source.is_invariant_violation(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        let message = err.to_string();
        match err.into_io_error() {
            Some(io_err) => Error::Io(io_err),
            None => Error::Io(io::Error::other(message)),
        }
    }
}
