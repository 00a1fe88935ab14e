//! Core types for playback synchronization

use cadenza_core::{MediaRef, PlayerOptions};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle phase of a now-playing session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Player setup and queue load in progress (or failed, awaiting retry)
    Initializing,

    /// Steady state; progress follows player ticks
    Ready,

    /// A skip is pending, in flight, or not yet confirmed by the player
    Skipping,

    /// A seek is pending or in flight
    Seeking,

    /// Screen gone; no further updates
    TornDown,
}

/// Direction of a tap-to-skip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipDirection {
    Next,
    Previous,
}

/// Canonical playback state of a session
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaybackSession {
    /// Queue position of the active track
    pub active_index: usize,

    /// Whether the player is playing
    pub is_playing: bool,

    /// Elapsed seconds of the active track
    pub position_seconds: f64,

    /// Length of the active track in seconds (0 while unknown)
    pub duration_seconds: f64,
}

/// Swipeable carousel position
///
/// At rest `visual_offset == settled_index * page_width`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CarouselState {
    /// Current scroll offset in page-width units times the page width
    pub visual_offset: f64,

    /// Page the carousel last settled on
    pub settled_index: usize,
}

/// Display data of the active track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlaying {
    pub title: String,
    pub artist: String,
    pub artwork: MediaRef,
    pub category_flag: Option<String>,
    /// Elapsed time label (`MM:SS`)
    pub elapsed: String,
    /// Remaining time label (`MM:SS`)
    pub remaining: String,
}

/// Read-only state handed to the views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub session: PlaybackSession,
    pub carousel: CarouselState,
    /// Number of tracks in the queue
    pub queue_len: usize,
    /// `None` until initialization completes
    pub now_playing: Option<NowPlaying>,
    /// Active index is an optimistic guess awaiting player confirmation
    pub unconfirmed: bool,
    /// Last initialization failure, shown with a retry affordance
    pub init_error: Option<String>,
}

impl SessionSnapshot {
    /// Whether the session satisfies the at-rest invariant
    pub fn is_settled(&self) -> bool {
        self.phase == SessionPhase::Ready
            && !self.unconfirmed
            && self.carousel.settled_index == self.session.active_index
    }
}

/// Configuration for a synchronization session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Width of one carousel page, in view units (default: 1.0)
    #[serde(default = "default_page_width")]
    pub page_width: f64,

    /// Timeout for transport commands in milliseconds (default: 5000)
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,

    /// Timeout for seeks in milliseconds (default: 2000)
    ///
    /// Seeks are best-effort: a timeout resolves the seek silently.
    #[serde(default = "default_seek_timeout_ms")]
    pub seek_timeout_ms: u64,

    /// Options passed to the player on setup
    #[serde(default)]
    pub player: PlayerOptions,
}

fn default_page_width() -> f64 {
    1.0
}

fn default_command_timeout_ms() -> u64 {
    5000
}

fn default_seek_timeout_ms() -> u64 {
    2000
}

impl SyncConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn seek_timeout(&self) -> Duration {
        Duration::from_millis(self.seek_timeout_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_width: default_page_width(),
            command_timeout_ms: default_command_timeout_ms(),
            seek_timeout_ms: default_seek_timeout_ms(),
            player: PlayerOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.page_width, 1.0);
        assert_eq!(config.command_timeout(), Duration::from_secs(5));
        assert_eq!(config.seek_timeout(), Duration::from_secs(2));
    }
}
