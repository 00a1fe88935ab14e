//! Cadenza Playback - Queue and Carousel Synchronization
//!
//! Keeps an external media player, a swipeable track carousel, and the
//! now-playing display in agreement.
//!
//! This crate provides:
//! - Rotated play queues (selected track first)
//! - A sans-IO synchronization controller
//! - An async session driver built on tokio
//! - `MM:SS` progress labels and end-of-track detection
//!
//! # Architecture
//!
//! `cadenza-playback` never decodes audio. The player is reached through
//! [`cadenza_core::PlayerAdapter`]; the controller itself is synchronous and
//! can be driven directly from tests:
//!
//! - [`SyncController`] owns session state and decides which command to send
//! - [`spawn_session`] runs a controller against a real adapter
//!
//! # Example: Driving the controller
//!
//! ```rust
//! use cadenza_core::{MediaRef, TrackDescriptor};
//! use cadenza_playback::{
//!     CommandAck, PlayQueue, PlayerCommand, SessionPhase, SkipDirection, SyncConfig,
//!     SyncController,
//! };
//!
//! let catalog: Vec<TrackDescriptor> = ["a", "b", "c"]
//!     .iter()
//!     .map(|id| TrackDescriptor::new(*id, *id, "Popular", MediaRef::new("art"), MediaRef::new("audio")))
//!     .collect();
//!
//! let queue = PlayQueue::build(&catalog, 1).unwrap();
//! let mut controller = SyncController::new(queue, SyncConfig::default());
//!
//! // The first command loads the queue
//! assert!(matches!(controller.poll_command(), Some(PlayerCommand::Load(_))));
//! controller.on_command_completed(Ok(CommandAck::default()));
//! assert_eq!(controller.phase(), SessionPhase::Ready);
//!
//! // Skips are optimistic until the player confirms them
//! controller.on_user_tap_skip(SkipDirection::Next);
//! assert_eq!(controller.session().active_index, 1);
//! assert_eq!(controller.poll_command(), Some(PlayerCommand::SkipTo(1)));
//! ```

#![forbid(unsafe_code)]

pub mod clock;
pub mod controller;
pub mod error;
pub mod events;
pub mod queue;
pub mod session;
pub mod types;

pub use clock::{format_clock, is_end_of_track, remaining_whole_seconds};
pub use controller::{CommandAck, CommandResult, SyncController};
pub use error::{InvalidQueueError, PlaybackError, Result};
pub use events::{CommandError, PlayerCommand, SessionNotice, UserIntent, ViewUpdate};
pub use queue::PlayQueue;
pub use session::{execute, spawn_session, SessionHandle};
pub use types::{
    CarouselState, NowPlaying, PlaybackSession, SessionPhase, SessionSnapshot, SkipDirection,
    SyncConfig,
};
