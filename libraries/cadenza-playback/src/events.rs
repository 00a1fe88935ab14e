//! Session events
//!
//! Three kinds of messages cross the controller boundary:
//! - `UserIntent`: gestures coming from the views
//! - `PlayerCommand`: work the controller wants done at the player
//! - `ViewUpdate` / `SessionNotice`: what the views and logs get back

use cadenza_core::TrackDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PlaybackError;
use crate::types::SkipDirection;

/// Gestures emitted by the carousel and transport views
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UserIntent {
    /// Skip button tapped
    TapSkip(SkipDirection),

    /// Carousel settled on a page
    SwipeSettle(usize),

    /// Carousel scrolled (gesture in flight)
    Scroll(f64),

    /// Carousel momentum ended at an offset
    ScrollEnd(f64),

    /// Progress slider released at a position in seconds
    ScrubRelease(f64),

    /// Play/pause button tapped
    TogglePlayback,

    /// Retry a failed initialization
    RetryInitialization,
}

/// Work for the external player
///
/// At most one command is in flight per session.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    /// Reset if needed, set up, load the queue, start playing
    Load(Vec<TrackDescriptor>),

    /// Jump to a queue position and play
    SkipTo(usize),

    /// Seek within the current track
    Seek(f64),

    /// Resume playback
    Play,

    /// Pause playback
    Pause,

    /// Explicit end-of-track stop: pause, then seek to zero
    StopAtEnd,
}

impl PlayerCommand {
    /// Short name for logs and failure notices
    pub fn name(&self) -> &'static str {
        match self {
            Self::Load(_) => "load",
            Self::SkipTo(_) => "skip",
            Self::Seek(_) => "seek",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::StopAtEnd => "stop-at-end",
        }
    }
}

impl fmt::Display for PlayerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(tracks) => write!(f, "load({} tracks)", tracks.len()),
            Self::SkipTo(index) => write!(f, "skip({})", index),
            Self::Seek(seconds) => write!(f, "seek({:.1}s)", seconds),
            other => f.write_str(other.name()),
        }
    }
}

/// Why a command did not complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The adapter returned an error
    Failed(String),

    /// The adapter did not answer in time
    TimedOut,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => f.write_str(reason),
            Self::TimedOut => f.write_str("timed out"),
        }
    }
}

/// Instructions for the carousel view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ViewUpdate {
    /// Scroll the carousel to a page
    ScrollTo {
        /// Page index
        index: usize,
        /// Scroll offset (`index * page_width`)
        offset: f64,
        /// Animate the scroll
        animated: bool,
    },
}

/// Observable outcomes that are not state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionNotice {
    /// Queue loaded and playback started
    Initialized,

    /// Player setup failed; the session waits for a retry
    InitFailed { reason: String },

    /// An authoritative track change overrode an optimistic index
    EventRaceIgnored {
        /// Index the controller had guessed
        optimistic: usize,
        /// Index the player reported
        authoritative: usize,
    },

    /// A pending skip was replaced before being issued
    SkipCoalesced { superseded: usize, target: usize },

    /// A command failed; state was left at the last known-good values
    CommandFailure { command: String, reason: String },

    /// The player reported the end of the queue
    QueueCompleted,

    /// End-of-track stop issued
    EndOfTrack { index: usize },
}

impl SessionNotice {
    /// Error carried by a failure notice
    pub fn error(&self) -> Option<PlaybackError> {
        match self {
            Self::InitFailed { reason } => Some(PlaybackError::PlayerInit(reason.clone())),
            Self::CommandFailure { command, reason } => Some(PlaybackError::CommandFailure {
                command: command.clone(),
                reason: reason.clone(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_notices_carry_errors() {
        let init = SessionNotice::InitFailed {
            reason: "no audio session".into(),
        };
        assert!(matches!(
            init.error(),
            Some(PlaybackError::PlayerInit(reason)) if reason == "no audio session"
        ));

        let skip = SessionNotice::CommandFailure {
            command: "skip".into(),
            reason: "timed out".into(),
        };
        assert_eq!(
            skip.error().map(|e| e.to_string()),
            Some("skip failed: timed out".to_string())
        );

        assert!(SessionNotice::QueueCompleted.error().is_none());
    }
}
