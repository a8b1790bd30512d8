use thiserror::Error;

use emoji_list_core::EmojiError;

/// Errors that can occur during CLI command execution.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// Loading, refreshing, or querying the catalogue failed
    #[error("{0}")]
    Emoji(#[from] EmojiError),

    /// I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
