//! Simulated media player
//!
//! Stands in for the native track player: keeps a queue, advances a clock on
//! a tokio interval and emits the same notifications a real player would.
//! Nothing is decoded; media references are never opened.
//!
//! End of track follows the configured repeat mode:
//! - `Off`: advance, or report the end of the queue after the last track
//! - `Track`: restart the same track
//! - `Queue`: advance, wrapping to the first track

use async_trait::async_trait;
use cadenza_core::{
    CoreError, PlayerAdapter, PlayerEvent, PlayerOptions, PlayerState, RepeatMode,
    TrackDescriptor,
};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::SimulatorSettings;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct SimState {
    options: Option<PlayerOptions>,
    tracks: Vec<TrackDescriptor>,
    current: Option<usize>,
    position: f64,
    state: PlayerState,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<SimState>,
    events: broadcast::Sender<PlayerEvent>,
    track_seconds: f64,
}

impl Shared {
    fn emit(&self, event: PlayerEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn set_state(&self, sim: &mut SimState, state: PlayerState) {
        if sim.state != state {
            sim.state = state;
            self.emit(PlayerEvent::StateChanged(state));
        }
    }

    fn load_track(&self, sim: &mut SimState, index: Option<usize>) {
        sim.current = index;
        sim.position = 0.0;
        self.emit(PlayerEvent::TrackChanged { next_index: index });
    }

    /// Advance the clock by one tick
    fn tick(&self, sim: &mut SimState, elapsed: f64) {
        let Some(current) = sim.current else {
            return;
        };
        if sim.state != PlayerState::Playing {
            return;
        }

        if sim.position >= self.track_seconds {
            self.finish_track(sim, current);
            return;
        }

        sim.position = (sim.position + elapsed).min(self.track_seconds);
        self.emit(PlayerEvent::Progress {
            position: sim.position,
            duration: self.track_seconds,
        });
    }

    fn finish_track(&self, sim: &mut SimState, current: usize) {
        let repeat_mode = sim
            .options
            .as_ref()
            .map(|o| o.repeat_mode)
            .unwrap_or_default();
        let last = sim.tracks.len().saturating_sub(1);

        match repeat_mode {
            RepeatMode::Track => {
                debug!(current, "Repeating track");
                sim.position = 0.0;
            }
            RepeatMode::Queue => {
                let next = if current >= last { 0 } else { current + 1 };
                self.load_track(sim, Some(next));
            }
            RepeatMode::Off if current < last => self.load_track(sim, Some(current + 1)),
            RepeatMode::Off => {
                info!("Simulated queue ended");
                self.load_track(sim, None);
                self.set_state(sim, PlayerState::Stopped);
            }
        }
    }
}

/// In-process player used by the terminal application and its tests
pub struct SimulatedPlayer {
    shared: Arc<Shared>,
    ticker: JoinHandle<()>,
}

impl SimulatedPlayer {
    /// Create a player and start its clock
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(settings: &SimulatorSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let shared = Arc::new(Shared {
            state: Mutex::new(SimState::default()),
            events,
            track_seconds: settings.track_seconds,
        });

        let ticker = tokio::spawn(run_clock(
            Arc::downgrade(&shared),
            settings.tick_interval(),
        ));

        Self { shared, ticker }
    }

    /// Transport state
    pub async fn state(&self) -> PlayerState {
        self.shared.state.lock().await.state
    }

    /// Position within the loaded track
    pub async fn position(&self) -> f64 {
        self.shared.state.lock().await.position
    }

    /// Tracks currently queued
    pub async fn queued_tracks(&self) -> Vec<TrackDescriptor> {
        self.shared.state.lock().await.tracks.clone()
    }

    /// Options the player was set up with
    pub async fn options(&self) -> Option<PlayerOptions> {
        self.shared.state.lock().await.options.clone()
    }

    /// Advance the clock by hand
    pub async fn advance(&self, seconds: f64) {
        let mut sim = self.shared.state.lock().await;
        self.shared.tick(&mut sim, seconds);
    }
}

impl Drop for SimulatedPlayer {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}

async fn run_clock(shared: Weak<Shared>, interval: Duration) {
    let mut ticks = tokio::time::interval(interval);
    ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick completes immediately
    ticks.tick().await;

    loop {
        ticks.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };
        let mut sim = shared.state.lock().await;
        shared.tick(&mut sim, interval.as_secs_f64());
    }
}

#[async_trait]
impl PlayerAdapter for SimulatedPlayer {
    async fn reset(&self) -> cadenza_core::Result<()> {
        let mut sim = self.shared.state.lock().await;
        debug!(tracks = sim.tracks.len(), "Simulated player reset");
        sim.tracks.clear();
        sim.current = None;
        sim.position = 0.0;
        self.shared.set_state(&mut sim, PlayerState::None);
        Ok(())
    }

    async fn setup(&self, options: &PlayerOptions) -> cadenza_core::Result<()> {
        let mut sim = self.shared.state.lock().await;
        debug!(repeat_mode = %options.repeat_mode, "Simulated player setup");
        sim.options = Some(options.clone());
        Ok(())
    }

    async fn add_tracks(&self, tracks: &[TrackDescriptor]) -> cadenza_core::Result<()> {
        let mut sim = self.shared.state.lock().await;
        if sim.options.is_none() {
            return Err(CoreError::PlayerNotReady);
        }
        sim.tracks.extend_from_slice(tracks);
        if sim.current.is_none() && !sim.tracks.is_empty() {
            self.shared.load_track(&mut sim, Some(0));
            self.shared.set_state(&mut sim, PlayerState::Ready);
        }
        Ok(())
    }

    async fn play(&self) -> cadenza_core::Result<()> {
        let mut sim = self.shared.state.lock().await;
        if sim.current.is_none() {
            debug!("Play with an empty queue ignored");
            return Ok(());
        }
        self.shared.set_state(&mut sim, PlayerState::Playing);
        Ok(())
    }

    async fn pause(&self) -> cadenza_core::Result<()> {
        let mut sim = self.shared.state.lock().await;
        if sim.current.is_some() {
            self.shared.set_state(&mut sim, PlayerState::Paused);
        }
        Ok(())
    }

    async fn skip_to_index(&self, index: usize) -> cadenza_core::Result<()> {
        let mut sim = self.shared.state.lock().await;
        if index >= sim.tracks.len() {
            return Err(CoreError::invalid_input(format!(
                "index {} out of range for {} queued tracks",
                index,
                sim.tracks.len()
            )));
        }
        self.shared.load_track(&mut sim, Some(index));
        Ok(())
    }

    async fn seek_to(&self, seconds: f64) -> cadenza_core::Result<()> {
        let mut sim = self.shared.state.lock().await;
        if sim.current.is_none() {
            return Err(CoreError::PlayerNotReady);
        }
        sim.position = seconds.clamp(0.0, self.shared.track_seconds);
        self.shared.emit(PlayerEvent::Progress {
            position: sim.position,
            duration: self.shared.track_seconds,
        });
        Ok(())
    }

    async fn current_index(&self) -> cadenza_core::Result<Option<usize>> {
        Ok(self.shared.state.lock().await.current)
    }

    fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.shared.events.subscribe()
    }
}
