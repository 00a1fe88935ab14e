/// External player contract types
use serde::{Deserialize, Serialize};

/// Repeat mode configured on the external player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when the queue ends
    #[default]
    Off,
    /// Loop the current track
    Track,
    /// Loop the entire queue
    Queue,
}

impl RepeatMode {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Track => "track",
            Self::Queue => "queue",
        }
    }
}

impl std::fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transport capabilities advertised to the OS media controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Play,
    Pause,
    SkipToNext,
    SkipToPrevious,
    SeekTo,
}

/// Options handed to the player on setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerOptions {
    /// Hold playback until the buffer is filled (default: true)
    #[serde(default = "default_wait_for_buffer")]
    pub wait_for_buffer: bool,

    /// Minimum buffered seconds (default: 5)
    #[serde(default = "default_min_buffer")]
    pub min_buffer: f64,

    /// Maximum buffered seconds (default: 15)
    #[serde(default = "default_max_buffer")]
    pub max_buffer: f64,

    /// Seconds buffered before playback starts (default: 3)
    #[serde(default = "default_play_buffer")]
    pub play_buffer: f64,

    /// Repeat mode (default: Off)
    #[serde(default)]
    pub repeat_mode: RepeatMode,

    /// Advertised capabilities
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<Capability>,
}

fn default_wait_for_buffer() -> bool {
    true
}

fn default_min_buffer() -> f64 {
    5.0
}

fn default_max_buffer() -> f64 {
    15.0
}

fn default_play_buffer() -> f64 {
    3.0
}

fn default_capabilities() -> Vec<Capability> {
    vec![
        Capability::Play,
        Capability::Pause,
        Capability::SkipToNext,
        Capability::SkipToPrevious,
    ]
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            wait_for_buffer: default_wait_for_buffer(),
            min_buffer: default_min_buffer(),
            max_buffer: default_max_buffer(),
            play_buffer: default_play_buffer(),
            repeat_mode: RepeatMode::default(),
            capabilities: default_capabilities(),
        }
    }
}

/// Transport state reported by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerState {
    /// Nothing loaded
    #[default]
    None,
    /// Track loaded, not started
    Ready,
    /// Waiting for data
    Buffering,
    /// Playing audio
    Playing,
    /// Paused mid-track
    Paused,
    /// Stopped (end of queue or explicit stop)
    Stopped,
}

impl PlayerState {
    /// Whether audio is (or is about to be) audible
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing | Self::Buffering)
    }
}

/// Notifications emitted by the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerEvent {
    /// Periodic progress of the loaded track
    Progress {
        /// Elapsed seconds
        position: f64,
        /// Track length in seconds (0 while unknown)
        duration: f64,
    },

    /// Playback moved to another queue position
    ///
    /// `None` signals the queue ended or wrapped.
    TrackChanged {
        /// New queue position
        next_index: Option<usize>,
    },

    /// Transport state changed
    StateChanged(PlayerState),
}
