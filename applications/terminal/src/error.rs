/// Terminal application error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("No track is playing")]
    NoSession,

    #[error(transparent)]
    Core(#[from] cadenza_core::CoreError),

    #[error(transparent)]
    Playback(#[from] cadenza_playback::PlaybackError),

    #[error("Invalid queue: {0}")]
    InvalidQueue(#[from] cadenza_playback::InvalidQueueError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
