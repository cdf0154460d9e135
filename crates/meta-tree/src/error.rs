//! Error types for meta-tree

use std::path::PathBuf;

/// Result type for tree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing or reconstructing a metadata file
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No recognizable root element within the first three lines. Callers
    /// skip such files with a log note; this is never fatal to a run.
    #[error("{path} is not a metadata file")]
    NotMetadata { path: String },

    #[error("{path}: section <{section}> is never closed")]
    UnclosedSection { path: String, section: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
