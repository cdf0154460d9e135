//! Error types for meta-diff

use std::path::PathBuf;

use crate::row::REQUIRED_COLUMNS;

/// Result type for diff operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while diffing or reading/writing reports
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error at {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(
        "diff log {path} is missing required column(s) {missing:?}; \
         a diff log must provide: {}",
        REQUIRED_COLUMNS.join(", ")
    )]
    MissingColumns {
        path: PathBuf,
        missing: Vec<String>,
    },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}
