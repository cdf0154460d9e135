//! Error types for meta-merge

use std::path::PathBuf;

/// Result type for merge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Unrecoverable merge errors. Per-row failures (missing targets,
/// unknown actions) are collected into the change log instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reconstruction swap failures are fatal for the run; the `.new` or
    /// `.orig` left on disk is the recovery hint.
    #[error(transparent)]
    Tree(#[from] meta_tree::Error),

    #[error(transparent)]
    Diff(#[from] meta_diff::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
