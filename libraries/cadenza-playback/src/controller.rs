//! Queue and carousel synchronization controller
//!
//! Keeps three things in agreement:
//! - the external player's queue position
//! - the carousel page the user sees
//! - the displayed title/artist/progress
//!
//! Inputs arrive from three independent sources (taps, swipes, player
//! events). The controller is the single writer of session state. It never
//! calls the player itself: it queues `PlayerCommand`s, the session driver
//! executes them one at a time and reports back through
//! [`SyncController::on_command_completed`].
//!
//! Rules:
//! - user skips update the active index optimistically and mark it
//!   unconfirmed until the player agrees
//! - skip requests coalesce: only the latest target is ever issued
//! - a player track-changed event always wins over an optimistic index

use std::collections::VecDeque;

use cadenza_core::{PlayerEvent, PlayerState};
use tracing::{debug, info, warn};

use crate::clock::{format_clock, is_end_of_track};
use crate::events::{CommandError, PlayerCommand, SessionNotice, UserIntent, ViewUpdate};
use crate::queue::PlayQueue;
use crate::types::{
    CarouselState, NowPlaying, PlaybackSession, SessionPhase, SessionSnapshot, SkipDirection,
    SyncConfig,
};

/// What the player reported after a command succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandAck {
    /// Queue position read back from the player after a skip
    pub observed_index: Option<usize>,
}

/// Outcome of an executed command
pub type CommandResult = std::result::Result<CommandAck, CommandError>;

#[derive(Debug)]
struct InFlight {
    command: PlayerCommand,
    /// An authoritative event resolved this command before it completed
    superseded: bool,
}

/// Single-writer state machine for one now-playing session
#[derive(Debug)]
pub struct SyncController {
    queue: PlayQueue,
    config: SyncConfig,
    phase: SessionPhase,
    session: PlaybackSession,
    carousel: CarouselState,

    /// Transport state, including optimistic play/pause
    player_state: PlayerState,
    /// Transport state as last reported by the player
    reported_state: PlayerState,

    /// Last queue position confirmed by the player
    confirmed_index: usize,
    unconfirmed: bool,
    gesture_active: bool,

    load_requested: bool,
    init_error: Option<String>,

    pending_skip: Option<usize>,
    /// Transport commands queued ahead of the pending skip
    skip_slot: usize,
    pending_seek: Option<f64>,
    pending_transport: VecDeque<PlayerCommand>,
    in_flight: Option<InFlight>,

    /// Set once the end-of-track stop is queued, cleared when the track moves
    end_stop_latched: bool,

    view_updates: Vec<ViewUpdate>,
    notices: Vec<SessionNotice>,
}

impl SyncController {
    /// Create a controller for a freshly built queue
    ///
    /// The first polled command loads the queue into the player.
    pub fn new(queue: PlayQueue, config: SyncConfig) -> Self {
        Self {
            queue,
            config,
            phase: SessionPhase::Initializing,
            session: PlaybackSession::default(),
            carousel: CarouselState::default(),
            player_state: PlayerState::None,
            reported_state: PlayerState::None,
            confirmed_index: 0,
            unconfirmed: false,
            gesture_active: false,
            load_requested: true,
            init_error: None,
            pending_skip: None,
            skip_slot: 0,
            pending_seek: None,
            pending_transport: VecDeque::new(),
            in_flight: None,
            end_stop_latched: false,
            view_updates: Vec::new(),
            notices: Vec::new(),
        }
    }

    // ===== Accessors =====

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn carousel(&self) -> &CarouselState {
        &self.carousel
    }

    pub fn queue(&self) -> &PlayQueue {
        &self.queue
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn player_state(&self) -> PlayerState {
        self.player_state
    }

    /// Active index is an optimistic guess
    pub fn is_unconfirmed(&self) -> bool {
        self.unconfirmed
    }

    pub fn has_command_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Read-only state for the views
    pub fn snapshot(&self) -> SessionSnapshot {
        let now_playing = if matches!(self.phase, SessionPhase::Initializing) {
            None
        } else {
            self.queue.get(self.session.active_index).map(|track| NowPlaying {
                title: track.title.clone(),
                artist: track.artist.clone(),
                artwork: track.artwork.clone(),
                category_flag: track.category_flag.clone(),
                elapsed: format_clock(self.session.position_seconds),
                remaining: format_clock(
                    self.session.duration_seconds - self.session.position_seconds,
                ),
            })
        };

        SessionSnapshot {
            phase: self.phase,
            session: self.session,
            carousel: self.carousel,
            queue_len: self.queue.len(),
            now_playing,
            unconfirmed: self.unconfirmed,
            init_error: self.init_error.clone(),
        }
    }

    /// Drain scroll requests for the carousel view
    pub fn take_view_updates(&mut self) -> Vec<ViewUpdate> {
        std::mem::take(&mut self.view_updates)
    }

    /// Drain notices (failures, races, completions)
    pub fn take_notices(&mut self) -> Vec<SessionNotice> {
        std::mem::take(&mut self.notices)
    }

    // ===== Dispatch =====

    /// Apply a gesture from the views
    pub fn apply_intent(&mut self, intent: UserIntent) {
        match intent {
            UserIntent::TapSkip(direction) => self.on_user_tap_skip(direction),
            UserIntent::SwipeSettle(index) => self.on_swipe_settle(index),
            UserIntent::Scroll(offset) => self.on_scroll(offset),
            UserIntent::ScrollEnd(offset) => self.on_scroll_end(offset),
            UserIntent::ScrubRelease(seconds) => self.on_scrub_release(seconds),
            UserIntent::TogglePlayback => self.toggle_playback(),
            UserIntent::RetryInitialization => self.retry_initialization(),
        }
    }

    /// Apply a notification from the player
    pub fn apply_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Progress { position, duration } => {
                self.on_progress_tick(position, duration);
            }
            PlayerEvent::TrackChanged { next_index } => self.on_player_track_changed(next_index),
            PlayerEvent::StateChanged(state) => self.on_player_state_changed(state),
        }
    }

    // ===== User intents =====

    /// Skip button tapped
    pub fn on_user_tap_skip(&mut self, direction: SkipDirection) {
        if !self.accepts_input("tap-skip") {
            return;
        }

        let current = self.session.active_index;
        let target = match direction {
            SkipDirection::Next => self.queue.wrap_next(current),
            SkipDirection::Previous => self.queue.wrap_previous(current),
        };
        debug!(?direction, current, target, "Tap skip");
        self.request_skip(target, true);
    }

    /// Carousel settled on a page
    pub fn on_swipe_settle(&mut self, visual_index: usize) {
        self.gesture_active = false;
        if !self.accepts_input("swipe-settle") {
            return;
        }

        if !self.queue.contains_index(visual_index) {
            warn!(
                visual_index,
                queue_len = self.queue.len(),
                "Carousel settled outside the queue; snapping back"
            );
            self.reconcile_carousel(true);
            return;
        }

        self.carousel.settled_index = visual_index;
        self.carousel.visual_offset = self.offset_of(visual_index);

        if visual_index == self.session.active_index {
            debug!(visual_index, "Swipe settled on the active page");
            self.refresh_phase();
            return;
        }

        debug!(visual_index, "Swipe settled on a new page");
        self.request_skip(visual_index, false);
    }

    /// Carousel scrolled mid-gesture
    pub fn on_scroll(&mut self, offset: f64) {
        if self.phase == SessionPhase::TornDown || !offset.is_finite() {
            return;
        }
        self.gesture_active = true;
        self.carousel.visual_offset = offset;
    }

    /// Carousel momentum ended; the nearest page is the settled one
    pub fn on_scroll_end(&mut self, offset: f64) {
        if self.phase == SessionPhase::TornDown {
            return;
        }
        if !offset.is_finite() {
            self.gesture_active = false;
            self.reconcile_carousel(true);
            return;
        }

        let page = (offset / self.config.page_width).round();
        if page < 0.0 {
            self.gesture_active = false;
            warn!(offset, "Carousel scrolled before the first page; snapping back");
            self.reconcile_carousel(true);
            return;
        }
        self.on_swipe_settle(page as usize);
    }

    /// Progress slider released
    pub fn on_scrub_release(&mut self, target_seconds: f64) {
        if !self.accepts_input("scrub") || !target_seconds.is_finite() {
            return;
        }

        let upper = if self.session.duration_seconds > 0.0 {
            self.session.duration_seconds
        } else {
            f64::MAX
        };
        let target = target_seconds.clamp(0.0, upper);

        if let Some(previous) = self.pending_seek.replace(target) {
            debug!(previous, target, "Seek coalesced");
        }
        self.session.position_seconds = target;
        self.end_stop_latched = false;
        self.refresh_phase();
    }

    /// Play/pause button tapped
    ///
    /// Plays only when the player is paused; any other state pauses.
    pub fn toggle_playback(&mut self) {
        if !self.accepts_input("toggle") {
            return;
        }

        let command = if self.player_state == PlayerState::Paused {
            self.player_state = PlayerState::Playing;
            PlayerCommand::Play
        } else {
            self.player_state = PlayerState::Paused;
            PlayerCommand::Pause
        };
        self.session.is_playing = self.player_state.is_playing();
        debug!(%command, "Toggle playback");
        self.pending_transport.push_back(command);
    }

    /// Re-arm the queue load after a failed initialization
    pub fn retry_initialization(&mut self) {
        if self.phase != SessionPhase::Initializing {
            debug!(phase = ?self.phase, "Retry ignored outside initialization");
            return;
        }
        if self.load_requested || self.in_flight.is_some() {
            debug!("Initialization already in progress");
            return;
        }
        info!("Retrying player initialization");
        self.init_error = None;
        self.load_requested = true;
    }

    // ===== Player events =====

    /// Authoritative track change from the player
    ///
    /// `None` means the queue ended or wrapped; the index resets to 0.
    pub fn on_player_track_changed(&mut self, next_index: Option<usize>) {
        match self.phase {
            SessionPhase::TornDown => return,
            SessionPhase::Initializing => {
                debug!(?next_index, "Track change before queue load; ignored");
                return;
            }
            _ => {}
        }

        let index = match next_index {
            None => {
                info!("Player reached the end of the queue");
                self.notices.push(SessionNotice::QueueCompleted);
                0
            }
            Some(index) if !self.queue.contains_index(index) => {
                warn!(
                    index,
                    queue_len = self.queue.len(),
                    "Player reported a position outside the queue; ignored"
                );
                return;
            }
            Some(index) => index,
        };

        self.apply_authoritative_index(index, next_index.is_none());
    }

    /// Transport state from the player
    pub fn on_player_state_changed(&mut self, state: PlayerState) {
        if matches!(
            self.phase,
            SessionPhase::TornDown | SessionPhase::Initializing
        ) {
            return;
        }
        self.reported_state = state;
        self.player_state = state;
        self.session.is_playing = state.is_playing();
    }

    /// Periodic progress from the player
    pub fn on_progress_tick(&mut self, position: f64, duration: f64) {
        if matches!(
            self.phase,
            SessionPhase::TornDown | SessionPhase::Initializing
        ) {
            return;
        }
        if !position.is_finite() || !duration.is_finite() {
            return;
        }

        self.session.position_seconds = position;
        self.session.duration_seconds = duration;

        if !is_end_of_track(position, duration) {
            self.end_stop_latched = false;
            return;
        }

        // The tick belongs to a track we are leaving
        if self.unconfirmed || self.pending_skip.is_some() || self.end_stop_latched {
            return;
        }

        let index = self.session.active_index;
        info!(index, position, duration, "End of track; pausing and rewinding");
        self.end_stop_latched = true;
        self.player_state = PlayerState::Paused;
        self.session.is_playing = false;
        self.pending_transport.push_back(PlayerCommand::StopAtEnd);
        self.notices.push(SessionNotice::EndOfTrack { index });
    }

    // ===== Command queue =====

    /// Next command to execute, if none is in flight
    pub fn poll_command(&mut self) -> Option<PlayerCommand> {
        if self.phase == SessionPhase::TornDown || self.in_flight.is_some() {
            return None;
        }

        let command = if self.load_requested {
            self.load_requested = false;
            PlayerCommand::Load(self.queue.tracks().to_vec())
        } else if self.phase == SessionPhase::Initializing {
            return None;
        } else if let Some(command) = self.next_queued() {
            command
        } else if let Some(seconds) = self.pending_seek.take() {
            PlayerCommand::Seek(seconds)
        } else {
            return None;
        };

        debug!(%command, "Issuing player command");
        self.in_flight = Some(InFlight {
            command: command.clone(),
            superseded: false,
        });
        self.refresh_phase();
        Some(command)
    }

    /// Report the outcome of the command returned by `poll_command`
    pub fn on_command_completed(&mut self, result: CommandResult) {
        let Some(InFlight {
            command,
            superseded,
        }) = self.in_flight.take()
        else {
            warn!("Command completion without a command in flight");
            return;
        };

        if self.phase == SessionPhase::TornDown {
            debug!(%command, "Completion after teardown; ignored");
            return;
        }

        match (command, result) {
            (PlayerCommand::Load(_), Ok(_)) => self.on_initialized(),
            (PlayerCommand::Load(_), Err(error)) => {
                let reason = error.to_string();
                warn!(%reason, "Player initialization failed");
                self.init_error = Some(reason.clone());
                self.notices.push(SessionNotice::InitFailed { reason });
            }
            (PlayerCommand::SkipTo(target), Ok(ack)) => {
                if superseded || self.pending_skip.is_some() {
                    debug!(target, "Skip completed after being superseded");
                } else if let Some(observed) = ack.observed_index {
                    if self.queue.contains_index(observed) {
                        self.apply_authoritative_index(observed, false);
                    }
                }
            }
            (PlayerCommand::SkipTo(target), Err(error)) => {
                self.record_failure("skip", &error);
                if !superseded && self.pending_skip.is_none() {
                    debug!(
                        target,
                        confirmed = self.confirmed_index,
                        "Reverting to last confirmed track"
                    );
                    self.session.active_index = self.confirmed_index;
                    self.unconfirmed = false;
                    if self.pending_transport.is_empty() {
                        self.player_state = self.reported_state;
                        self.session.is_playing = self.reported_state.is_playing();
                    }
                    self.reconcile_carousel(true);
                }
            }
            (PlayerCommand::Seek(seconds), Err(CommandError::TimedOut)) => {
                debug!(seconds, "Seek unacknowledged; position resyncs on next tick");
            }
            (PlayerCommand::Seek(_), Err(error)) => self.record_failure("seek", &error),
            (command @ (PlayerCommand::Play | PlayerCommand::Pause | PlayerCommand::StopAtEnd), Err(error)) => {
                self.record_failure(command.name(), &error);
                self.player_state = self.reported_state;
                self.session.is_playing = self.reported_state.is_playing();
            }
            (command, Ok(_)) => debug!(%command, "Player command acknowledged"),
        }

        self.refresh_phase();
    }

    /// Stop reconciling; nothing is sent to the player
    ///
    /// Playback is process-wide and keeps going after the screen is gone.
    pub fn teardown(&mut self) {
        if self.phase == SessionPhase::TornDown {
            return;
        }
        info!(
            active_index = self.session.active_index,
            in_flight = self.in_flight.is_some(),
            "Session torn down"
        );
        self.phase = SessionPhase::TornDown;
        self.load_requested = false;
        self.pending_skip = None;
        self.skip_slot = 0;
        self.pending_seek = None;
        self.pending_transport.clear();
        self.view_updates.clear();
    }

    // ===== Internals =====

    fn accepts_input(&self, what: &str) -> bool {
        match self.phase {
            SessionPhase::Initializing | SessionPhase::TornDown => {
                debug!(what, phase = ?self.phase, "Input ignored; no track loaded");
                false
            }
            _ => true,
        }
    }

    fn on_initialized(&mut self) {
        info!(queue_len = self.queue.len(), "Queue loaded; playback started");
        self.phase = SessionPhase::Ready;
        self.init_error = None;
        self.confirmed_index = 0;
        self.session = PlaybackSession {
            active_index: 0,
            is_playing: true,
            position_seconds: 0.0,
            duration_seconds: 0.0,
        };
        self.player_state = PlayerState::Playing;
        self.unconfirmed = false;
        self.carousel = CarouselState::default();
        self.view_updates.push(ViewUpdate::ScrollTo {
            index: 0,
            offset: 0.0,
            animated: false,
        });
        self.notices.push(SessionNotice::Initialized);
    }

    fn request_skip(&mut self, target: usize, scroll: bool) {
        match self.pending_skip.replace(target) {
            Some(superseded) if superseded != target => {
                debug!(superseded, target, "Skip coalesced");
                self.notices
                    .push(SessionNotice::SkipCoalesced { superseded, target });
            }
            Some(_) => {}
            // A coalesced skip keeps the slot of the first request
            None => self.skip_slot = self.pending_transport.len(),
        }

        self.session.active_index = target;
        self.session.position_seconds = 0.0;
        self.session.duration_seconds = 0.0;
        self.unconfirmed = true;
        // Skipping starts playback
        self.player_state = PlayerState::Playing;
        self.session.is_playing = true;
        self.leave_track();

        if scroll {
            self.carousel.settled_index = target;
            self.carousel.visual_offset = self.offset_of(target);
            self.view_updates.push(ViewUpdate::ScrollTo {
                index: target,
                offset: self.carousel.visual_offset,
                animated: true,
            });
        }
        self.refresh_phase();
    }

    fn apply_authoritative_index(&mut self, index: usize, wrapped: bool) {
        if let Some(target) = self.pending_skip.take() {
            if target != index {
                debug!(
                    optimistic = target,
                    authoritative = index,
                    "Pending skip discarded by player event"
                );
                self.notices.push(SessionNotice::EventRaceIgnored {
                    optimistic: target,
                    authoritative: index,
                });
            }
        } else if self.unconfirmed && self.session.active_index != index {
            debug!(
                optimistic = self.session.active_index,
                authoritative = index,
                "Optimistic index overridden by player event"
            );
            self.notices.push(SessionNotice::EventRaceIgnored {
                optimistic: self.session.active_index,
                authoritative: index,
            });
        }

        if let Some(in_flight) = self.in_flight.as_mut() {
            if matches!(in_flight.command, PlayerCommand::SkipTo(_)) {
                in_flight.superseded = true;
            }
        }

        let moved = wrapped || index != self.confirmed_index;
        self.confirmed_index = index;
        self.session.active_index = index;
        self.unconfirmed = false;

        if moved {
            self.session.position_seconds = 0.0;
            self.leave_track();
        }

        self.reconcile_carousel(true);
        self.refresh_phase();
    }

    /// Transport and skip commands in the order they were requested
    fn next_queued(&mut self) -> Option<PlayerCommand> {
        if self.skip_slot == 0 {
            if let Some(target) = self.pending_skip.take() {
                return Some(PlayerCommand::SkipTo(target));
            }
        }
        if let Some(command) = self.pending_transport.pop_front() {
            self.skip_slot = self.skip_slot.saturating_sub(1);
            return Some(command);
        }
        self.pending_skip.take().map(PlayerCommand::SkipTo)
    }

    /// Work tied to the track being left is dropped
    fn leave_track(&mut self) {
        self.end_stop_latched = false;
        self.pending_seek = None;

        let slot = self.skip_slot;
        let mut position = 0;
        let mut dropped_ahead = 0;
        self.pending_transport.retain(|c| {
            let keep = !matches!(c, PlayerCommand::StopAtEnd);
            if !keep && position < slot {
                dropped_ahead += 1;
            }
            position += 1;
            keep
        });
        self.skip_slot -= dropped_ahead;
    }

    fn reconcile_carousel(&mut self, animated: bool) {
        if self.gesture_active {
            return;
        }

        let index = self.session.active_index;
        let offset = self.offset_of(index);
        if self.carousel.settled_index == index && self.carousel.visual_offset == offset {
            return;
        }

        debug!(
            from = self.carousel.settled_index,
            to = index,
            "Scrolling carousel to active track"
        );
        self.carousel.settled_index = index;
        self.carousel.visual_offset = offset;
        self.view_updates.push(ViewUpdate::ScrollTo {
            index,
            offset,
            animated,
        });
    }

    fn record_failure(&mut self, command: &str, error: &CommandError) {
        warn!(command, %error, "Player command failed");
        self.notices.push(SessionNotice::CommandFailure {
            command: command.to_string(),
            reason: error.to_string(),
        });
    }

    fn refresh_phase(&mut self) {
        if matches!(
            self.phase,
            SessionPhase::Initializing | SessionPhase::TornDown
        ) {
            return;
        }

        let seek_in_flight = matches!(
            self.in_flight,
            Some(InFlight {
                command: PlayerCommand::Seek(_),
                ..
            })
        );

        let next = if self.unconfirmed || self.pending_skip.is_some() {
            SessionPhase::Skipping
        } else if self.pending_seek.is_some() || seek_in_flight {
            SessionPhase::Seeking
        } else {
            SessionPhase::Ready
        };

        if next != self.phase {
            debug!(from = ?self.phase, to = ?next, "Session phase changed");
            self.phase = next;
        }
    }

    fn offset_of(&self, index: usize) -> f64 {
        index as f64 * self.config.page_width
    }
}
