//! Error types for playback synchronization

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Queue could not be built from the catalog and start index
    #[error("Invalid queue: {0}")]
    InvalidQueue(#[from] InvalidQueueError),

    /// External player setup or queue load failed
    #[error("Player initialization failed: {0}")]
    PlayerInit(String),

    /// A transport command failed at the player
    #[error("{command} failed: {reason}")]
    CommandFailure {
        /// Command that failed
        command: String,
        /// Failure reported by the adapter
        reason: String,
    },

    /// The session task is gone
    #[error("Session closed")]
    SessionClosed,
}

/// Rejected queue construction
///
/// Out-of-range start indices are caller errors; they are never clamped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidQueueError {
    /// Catalog has no tracks
    #[error("catalog is empty")]
    EmptyCatalog,

    /// Start index outside the catalog
    #[error("start index {index} out of range for {len} tracks")]
    StartIndexOutOfRange {
        /// Requested start index
        index: usize,
        /// Catalog length
        len: usize,
    },
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
