//! Typed errors for the source and storage adapters.
//!
//! Core commands never return these to their callers; the stores log them
//! and fall back to an empty or unchanged state.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to fetch or decode rows from a tabular source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read source {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse source {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed CSV in {}: {message}", path.display())]
    Csv { path: PathBuf, message: String },

    #[error("source is not a list of row objects: {0}")]
    Shape(String),
}

/// Failure to read or write a persisted state snapshot.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for key `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to (de)serialize key `{key}`: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
