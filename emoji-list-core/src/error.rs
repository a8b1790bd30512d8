/// Errors that can occur while loading, refreshing, or querying the emoji catalogue.
#[derive(Debug, thiserror::Error)]
pub enum EmojiError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A data line could not be turned into an emoji entry.
    #[error("Catalogue format error: {0}")]
    Format(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The binary cache is corrupt or truncated.
    #[error("Invalid cache data: {0}")]
    InvalidData(String),

    #[error("Fetch failed: {0}")]
    Transport(String),

    #[error("Emoji catalogue has not been loaded; call auto_initialize first")]
    NotLoaded,

    #[error("Emoji catalogue was loaded but contains no groups")]
    EmptyCatalogue,

    /// Neither the cache nor the network produced any data.
    #[error("Could not initialize emoji catalogue: no usable cache and refresh failed: {0}")]
    FatalInit(Box<EmojiError>),

    #[error("Config error: {0}")]
    Config(String),
}

impl EmojiError {
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for the two "service not usable yet" conditions.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::NotLoaded | Self::EmptyCatalogue)
    }
}
