/// Core traits for Cadenza
use crate::error::Result;
use crate::types::{NavigationRequest, PlayerEvent, PlayerOptions, TrackDescriptor};
use async_trait::async_trait;
use tokio::sync::broadcast;

/// External media player adapter
///
/// Implementers wrap the platform's media player (the native track player on
/// mobile, a simulated player in the terminal application). The player owns
/// decoding, buffering and the audio session; Cadenza only drives its queue
/// and transport.
///
/// The player is process-wide: it outlives the screens that drive it, so no
/// caller may assume a session teardown stops playback.
#[async_trait]
pub trait PlayerAdapter: Send + Sync {
    /// Drop the loaded queue and return to an unconfigured state
    async fn reset(&self) -> Result<()>;

    /// Configure the player (buffers, repeat mode, capabilities)
    ///
    /// # Errors
    /// Returns an error if the native player cannot be initialized
    async fn setup(&self, options: &PlayerOptions) -> Result<()>;

    /// Append tracks to the player's queue, preserving their order
    async fn add_tracks(&self, tracks: &[TrackDescriptor]) -> Result<()>;

    /// Start or resume playback
    async fn play(&self) -> Result<()>;

    /// Pause playback
    async fn pause(&self) -> Result<()>;

    /// Jump to a queue position
    ///
    /// # Errors
    /// Returns an error if the index is not in the loaded queue
    async fn skip_to_index(&self, index: usize) -> Result<()>;

    /// Seek within the current track
    async fn seek_to(&self, seconds: f64) -> Result<()>;

    /// Queue position of the loaded track, `None` when nothing is loaded
    async fn current_index(&self) -> Result<Option<usize>>;

    /// Subscribe to progress, track-changed and state-changed notifications
    fn subscribe(&self) -> broadcast::Receiver<PlayerEvent>;
}

/// Navigation collaborator
///
/// The core only ever hands over a screen name and a parameter bag. Stack
/// state and transitions belong to the implementer.
pub trait Navigator {
    /// Push a screen
    ///
    /// # Errors
    /// Returns an error if the screen is unknown or its parameters are invalid
    fn navigate_to(&mut self, request: NavigationRequest) -> Result<()>;

    /// Pop the current screen; returns `false` when already at the root
    fn go_back(&mut self) -> bool;
}
