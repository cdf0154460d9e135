//! Error types for meta-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from meta-config
    #[error(transparent)]
    Config(#[from] meta_config::Error),

    /// Error from meta-tree
    #[error(transparent)]
    Tree(#[from] meta_tree::Error),

    /// Error from meta-diff
    #[error(transparent)]
    Diff(#[from] meta_diff::Error),

    /// Error from meta-merge
    #[error(transparent)]
    Merge(#[from] meta_merge::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Interactive prompt error
    #[error("Interactive prompt error: {0}")]
    Dialoguer(#[from] dialoguer::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
