//! Session driver
//!
//! Runs a [`SyncController`] on a background task and connects it to a
//! [`PlayerAdapter`]:
//!
//! ```text
//! views ──intents──▶ ┌──────────────┐ ──commands──▶ player
//!                    │ session task │
//! views ◀─snapshots─ └──────────────┘ ◀──events──── player
//! ```
//!
//! Intents are drained before the next command is issued so a burst of
//! gestures collapses into one skip. Commands and position reads run on their
//! own tasks under a timeout; their outcome comes back over a channel and the
//! loop never blocks on the player.

use std::sync::Arc;

use cadenza_core::{PlayerAdapter, PlayerEvent, PlayerOptions};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::controller::{CommandAck, CommandResult, SyncController};
use crate::error::{PlaybackError, Result};
use crate::events::{CommandError, PlayerCommand, SessionNotice, UserIntent, ViewUpdate};
use crate::queue::PlayQueue;
use crate::types::{SessionPhase, SessionSnapshot, SkipDirection, SyncConfig};

const INTENT_CAPACITY: usize = 64;
const BROADCAST_CAPACITY: usize = 64;

enum SessionMessage {
    Intent(UserIntent),
    Close(oneshot::Sender<()>),
}

/// Work finished off the session task
enum Feedback {
    Command(CommandResult),
    /// Queue position read back after missed events
    Resync(Option<usize>),
}

/// Handle to a running session
///
/// Dropping the handle tears the session down. Playback continues: the
/// player is never paused on teardown.
pub struct SessionHandle {
    intents: mpsc::Sender<SessionMessage>,
    snapshots: watch::Receiver<SessionSnapshot>,
    view_updates: broadcast::Sender<ViewUpdate>,
    notices: broadcast::Sender<SessionNotice>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Send a gesture to the session
    ///
    /// # Errors
    /// Returns `SessionClosed` if the session task has stopped
    pub async fn send(&self, intent: UserIntent) -> Result<()> {
        self.intents
            .send(SessionMessage::Intent(intent))
            .await
            .map_err(|_| PlaybackError::SessionClosed)
    }

    pub async fn tap_skip(&self, direction: SkipDirection) -> Result<()> {
        self.send(UserIntent::TapSkip(direction)).await
    }

    pub async fn swipe_settle(&self, visual_index: usize) -> Result<()> {
        self.send(UserIntent::SwipeSettle(visual_index)).await
    }

    pub async fn scroll(&self, offset: f64) -> Result<()> {
        self.send(UserIntent::Scroll(offset)).await
    }

    pub async fn scroll_end(&self, offset: f64) -> Result<()> {
        self.send(UserIntent::ScrollEnd(offset)).await
    }

    pub async fn scrub_release(&self, seconds: f64) -> Result<()> {
        self.send(UserIntent::ScrubRelease(seconds)).await
    }

    pub async fn toggle_playback(&self) -> Result<()> {
        self.send(UserIntent::TogglePlayback).await
    }

    pub async fn retry_initialization(&self) -> Result<()> {
        self.send(UserIntent::RetryInitialization).await
    }

    /// Latest published state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Watch published state
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Carousel scroll requests
    pub fn view_updates(&self) -> broadcast::Receiver<ViewUpdate> {
        self.view_updates.subscribe()
    }

    /// Failures, races and lifecycle notices
    pub fn notices(&self) -> broadcast::Receiver<SessionNotice> {
        self.notices.subscribe()
    }

    /// Wait for the queue load to finish
    ///
    /// # Errors
    /// Returns `PlayerInit` if setup failed (the session stays open and
    /// accepts a retry), `SessionClosed` if the session stops first
    pub async fn wait_until_ready(&self) -> Result<SessionSnapshot> {
        let snapshot = self
            .wait_until(|s| s.phase != SessionPhase::Initializing || s.init_error.is_some())
            .await?;
        match (&snapshot.phase, &snapshot.init_error) {
            (SessionPhase::Initializing, Some(reason)) => {
                Err(PlaybackError::PlayerInit(reason.clone()))
            }
            _ => Ok(snapshot),
        }
    }

    /// Wait until the published state satisfies `predicate`
    ///
    /// # Errors
    /// Returns `SessionClosed` if the session stops first
    pub async fn wait_until<F>(&self, mut predicate: F) -> Result<SessionSnapshot>
    where
        F: FnMut(&SessionSnapshot) -> bool,
    {
        let mut snapshots = self.snapshots.clone();
        let snapshot = snapshots
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| PlaybackError::SessionClosed)?;
        Ok(snapshot.clone())
    }

    /// Tear the session down and wait for its task to finish
    ///
    /// Commands already handed to the player are left to complete.
    pub async fn close(self) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self
            .intents
            .send(SessionMessage::Close(ack_tx))
            .await
            .is_ok()
        {
            let _ = ack_rx.await;
        }
        self.task.await.map_err(|_| PlaybackError::SessionClosed)
    }
}

/// Start a session for a built queue
///
/// Must be called from within a tokio runtime. The player is loaded with the
/// queue and starts playing as soon as the session task runs.
pub fn spawn_session<P>(player: Arc<P>, queue: PlayQueue, config: SyncConfig) -> SessionHandle
where
    P: PlayerAdapter + ?Sized + 'static,
{
    let controller = SyncController::new(queue, config);
    let (intent_tx, intent_rx) = mpsc::channel(INTENT_CAPACITY);
    let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());
    let (view_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
    let (notice_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
    let (feedback_tx, feedback_rx) = mpsc::unbounded_channel();

    // Subscribe before the first command so no event from the load is missed
    let events = player.subscribe();

    let driver = SessionDriver {
        player,
        controller,
        snapshot_tx,
        view_tx: view_tx.clone(),
        notice_tx: notice_tx.clone(),
        feedback_tx,
        resyncing: false,
    };
    let task = tokio::spawn(driver.run(intent_rx, events, feedback_rx));

    SessionHandle {
        intents: intent_tx,
        snapshots: snapshot_rx,
        view_updates: view_tx,
        notices: notice_tx,
        task,
    }
}

struct SessionDriver<P: ?Sized> {
    player: Arc<P>,
    controller: SyncController,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    view_tx: broadcast::Sender<ViewUpdate>,
    notice_tx: broadcast::Sender<SessionNotice>,
    feedback_tx: mpsc::UnboundedSender<Feedback>,
    resyncing: bool,
}

impl<P> SessionDriver<P>
where
    P: PlayerAdapter + ?Sized + 'static,
{
    async fn run(
        mut self,
        mut intents: mpsc::Receiver<SessionMessage>,
        mut events: broadcast::Receiver<PlayerEvent>,
        mut feedback: mpsc::UnboundedReceiver<Feedback>,
    ) {
        info!(queue_len = self.controller.queue().len(), "Session started");
        let mut events_open = true;

        loop {
            self.dispatch();
            self.publish();

            tokio::select! {
                message = intents.recv() => {
                    let Some(message) = message else {
                        debug!("All session handles dropped");
                        break;
                    };
                    if let Some(ack) = self.handle_message(message) {
                        let _ = ack.send(());
                        break;
                    }
                    // Coalesce a burst of gestures before issuing anything
                    let mut close_ack = None;
                    while let Ok(message) = intents.try_recv() {
                        if let Some(ack) = self.handle_message(message) {
                            close_ack = Some(ack);
                            break;
                        }
                    }
                    if let Some(ack) = close_ack {
                        let _ = ack.send(());
                        break;
                    }
                }

                event = events.recv(), if events_open => match event {
                    Ok(event) => self.controller.apply_player_event(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Player events dropped; resyncing queue position");
                        self.resync_index();
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        warn!("Player event stream closed");
                        events_open = false;
                    }
                },

                Some(feedback) = feedback.recv() => match feedback {
                    Feedback::Command(result) => self.controller.on_command_completed(result),
                    Feedback::Resync(index) => {
                        self.resyncing = false;
                        if index.is_some() {
                            self.controller.on_player_track_changed(index);
                        }
                    }
                },
            }
        }

        self.controller.teardown();
        info!("Session stopped");
    }

    /// Returns the close acknowledgement when the message ends the session
    fn handle_message(&mut self, message: SessionMessage) -> Option<oneshot::Sender<()>> {
        match message {
            SessionMessage::Intent(intent) => {
                self.controller.apply_intent(intent);
                None
            }
            SessionMessage::Close(ack) => Some(ack),
        }
    }

    fn dispatch(&mut self) {
        let Some(command) = self.controller.poll_command() else {
            return;
        };

        let timeout = match command {
            PlayerCommand::Seek(_) => self.controller.config().seek_timeout(),
            _ => self.controller.config().command_timeout(),
        };
        let options = self.controller.config().player.clone();
        let player = Arc::clone(&self.player);
        let feedback_tx = self.feedback_tx.clone();

        tokio::spawn(async move {
            let result =
                match tokio::time::timeout(timeout, execute(player.as_ref(), &command, &options))
                    .await
                {
                    Ok(Ok(ack)) => Ok(ack),
                    Ok(Err(e)) => Err(CommandError::Failed(e.to_string())),
                    Err(_) => Err(CommandError::TimedOut),
                };
            // Receiver is gone once the session stops
            let _ = feedback_tx.send(Feedback::Command(result));
        });
    }

    fn publish(&mut self) {
        let snapshot = self.controller.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });

        for update in self.controller.take_view_updates() {
            let _ = self.view_tx.send(update);
        }
        for notice in self.controller.take_notices() {
            let _ = self.notice_tx.send(notice);
        }
    }

    fn resync_index(&mut self) {
        if self.resyncing {
            return;
        }
        self.resyncing = true;

        let timeout = self.controller.config().command_timeout();
        let player = Arc::clone(&self.player);
        let feedback_tx = self.feedback_tx.clone();

        tokio::spawn(async move {
            let index = match tokio::time::timeout(timeout, player.current_index()).await {
                Ok(Ok(index)) => {
                    if index.is_none() {
                        debug!("Player has no loaded track");
                    }
                    index
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "Failed to read queue position");
                    None
                }
                Err(_) => {
                    warn!("Timed out reading queue position");
                    None
                }
            };
            let _ = feedback_tx.send(Feedback::Resync(index));
        });
    }
}

/// Run one command against the player
///
/// `Load` resets a previously loaded queue first, then sets the player up,
/// adds the tracks and starts playback. `SkipTo` plays after skipping and
/// reads the position back.
pub async fn execute<P>(
    player: &P,
    command: &PlayerCommand,
    options: &PlayerOptions,
) -> cadenza_core::Result<CommandAck>
where
    P: PlayerAdapter + ?Sized,
{
    match command {
        PlayerCommand::Load(tracks) => {
            if player.current_index().await?.is_some() {
                debug!("Resetting previously loaded queue");
                player.reset().await?;
            }
            player.setup(options).await?;
            player.add_tracks(tracks).await?;
            player.play().await?;
        }
        PlayerCommand::SkipTo(index) => {
            player.skip_to_index(*index).await?;
            player.play().await?;
            let observed_index = match player.current_index().await {
                Ok(index) => index,
                Err(e) => {
                    debug!(error = %e, "Could not read back queue position");
                    None
                }
            };
            return Ok(CommandAck { observed_index });
        }
        PlayerCommand::Seek(seconds) => player.seek_to(*seconds).await?,
        PlayerCommand::Play => player.play().await?,
        PlayerCommand::Pause => player.pause().await?,
        PlayerCommand::StopAtEnd => {
            player.pause().await?;
            player.seek_to(0.0).await?;
        }
    }
    Ok(CommandAck::default())
}
