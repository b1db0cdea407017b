//! Error types for paper indexing and search.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A paper record could not be turned into a document. Aborts the build.
    #[error("Invalid paper record {record}: {reason}")]
    Validation { record: String, reason: String },

    /// The index directory could not be created, opened, locked or committed.
    #[error("Index I/O error at {path}: {reason}")]
    IndexIo { path: PathBuf, reason: String },

    /// Search was attempted before any build committed an index.
    #[error("No committed index found at {0}")]
    IndexNotFound(PathBuf),

    /// The caller asked for a result shape this crate cannot build.
    #[error("Unsupported result type: {0}")]
    UnsupportedResultType(String),

    /// The index on disk was built with a different analyzer than the one configured.
    #[error("Analyzer mismatch: index uses '{found}', configuration expects '{expected}'")]
    AnalyzerMismatch { expected: String, found: String },

    /// Bad configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Paper input file could not be read or parsed.
    #[error("Input error in {path}: {reason}")]
    Input { path: PathBuf, reason: String },

    /// Query-time engine failure.
    #[error("Search failed: {0}")]
    Search(#[from] tantivy::TantivyError),
}

impl Error {
    pub fn validation(record: impl ToString, reason: impl Into<String>) -> Self {
        Self::Validation {
            record: record.to_string(),
            reason: reason.into(),
        }
    }

    pub fn index_io(path: &Path, reason: impl ToString) -> Self {
        Self::IndexIo {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn input(path: &Path, reason: impl ToString) -> Self {
        Self::Input {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}
