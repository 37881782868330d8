use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelFinderError {
    #[error("missing required argument: {name}")]
    MissingArgument { name: &'static str },

    #[error("'{name}' cannot be used as a resource name")]
    InvalidName { name: String },

    #[error("{error} : {message}")]
    Server { error: String, message: String },

    #[error("{status} {url}")]
    Status { status: u16, url: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("unable to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Failed to parse config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Config key not found: {key}")]
    ConfigKeyNotFound { key: String },
}

pub type Result<T> = std::result::Result<T, ChannelFinderError>;

impl ChannelFinderError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingArgument { .. } | Self::InvalidName { .. } => 2,
            Self::Server { .. } | Self::Status { .. } => 3,
            Self::Transport(_) => 4,
            Self::ConfigParse { .. } | Self::ConfigKeyNotFound { .. } | Self::InvalidUrl { .. } => 5,
            _ => 1,
        }
    }

    /// Whether this error was raised before any request was sent
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingArgument { .. } | Self::InvalidName { .. }
        )
    }
}
