//! Application context
//!
//! Owns the process-wide player, the catalogs, the route stack, and the
//! session of the now-playing screen. Screens only borrow the session.
//!
//! The session lives as long as its now-playing route is on the stack: lists
//! pushed on top leave it running, and coming back re-attaches to it. It is
//! torn down when that route is popped, truncated away by `Home`, or replaced
//! by a newer now-playing screen. The player is never paused by teardown.

use crate::catalog::Library;
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::router::{Route, Router};
use crate::screens::{self, ScreenCommand};
use cadenza_core::{CategoryId, NavigationRequest, Navigator, PlayerAdapter, ALL_TRACKS_CATEGORY};
use cadenza_playback::{spawn_session, PlayQueue, PlaybackError, SessionHandle, SessionNotice};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{info, warn};

/// Whether the command loop keeps going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Session bound to the now-playing route
pub struct ActiveSession {
    pub category: CategoryId,
    pub selected_index: usize,
    pub handle: SessionHandle,
    notices: broadcast::Receiver<SessionNotice>,
}

pub struct AppContext {
    config: AppConfig,
    library: Library,
    player: Arc<dyn PlayerAdapter>,
    router: Router,
    session: Option<ActiveSession>,
}

impl AppContext {
    pub fn new(config: AppConfig, library: Library, player: Arc<dyn PlayerAdapter>) -> Self {
        Self {
            config,
            library,
            player,
            router: Router::new(),
            session: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn player(&self) -> &Arc<dyn PlayerAdapter> {
        &self.player
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn route(&self) -> &Route {
        self.router.current()
    }

    /// Session of the now-playing screen, if it is open
    pub fn session(&self) -> Option<&SessionHandle> {
        self.session.as_ref().map(|s| &s.handle)
    }

    pub fn active_session(&self) -> Option<&ActiveSession> {
        self.session.as_ref()
    }

    /// Navigate to a screen
    ///
    /// The request is validated before the stack changes: an unknown
    /// category or an out-of-range track index leaves the current screen in
    /// place.
    pub async fn navigate(&mut self, request: NavigationRequest) -> Result<()> {
        let route = Route::from_request(&request)?;
        let queue = self.prepare(&route)?;

        self.router.navigate_to(request)?;
        if matches!(route, Route::Home | Route::NowPlaying { .. }) {
            self.end_session().await;
        }

        if let (
            Route::NowPlaying {
                category,
                selected_index,
            },
            Some(queue),
        ) = (route, queue)
        {
            self.start_session(category, selected_index, queue);
        }
        Ok(())
    }

    /// Open the track list of a category (`all` for every track)
    pub async fn open_category(&mut self, category: &CategoryId) -> Result<()> {
        let route = if category.as_str() == ALL_TRACKS_CATEGORY {
            Route::AllTracks
        } else {
            Route::TrackList {
                category: category.clone(),
            }
        };
        self.navigate(route.to_request()).await
    }

    /// Play a row of the open track list
    pub async fn select_track(&mut self, index: usize) -> Result<&SessionHandle> {
        let category = self
            .router
            .current()
            .list_category()
            .ok_or_else(|| AppError::Navigation("no track list is open".to_string()))?;

        let route = Route::NowPlaying {
            category,
            selected_index: index,
        };
        self.navigate(route.to_request()).await?;
        self.session().ok_or(AppError::NoSession)
    }

    /// Pop the current screen; `false` at the root
    ///
    /// Uncovering the now-playing screen re-attaches to its running session.
    /// An older now-playing screen whose session was replaced reloads its
    /// queue.
    pub async fn go_back(&mut self) -> Result<bool> {
        let routes = self.router.routes();
        let [.., landing, leaving] = routes else {
            return Ok(false);
        };
        let leaving_player = matches!(leaving, Route::NowPlaying { .. });

        let reload = match landing {
            Route::NowPlaying {
                category,
                selected_index,
            } if leaving_player || self.session.is_none() => Some((
                category.clone(),
                *selected_index,
                self.build_queue(category, *selected_index)?,
            )),
            _ => None,
        };

        self.router.go_back();
        if leaving_player {
            self.end_session().await;
        }
        if let Some((category, selected_index, queue)) = reload {
            self.start_session(category, selected_index, queue);
        }
        Ok(true)
    }

    /// Apply a parsed command
    pub async fn handle(&mut self, command: ScreenCommand) -> Result<Flow> {
        match command {
            ScreenCommand::Intent(intent) => {
                let session = self.session().ok_or(AppError::NoSession)?;
                session.send(intent).await?;
            }
            ScreenCommand::Open(category) => self.open_category(&category).await?,
            ScreenCommand::Select(index) => {
                self.select_track(index).await?;
            }
            ScreenCommand::Back => {
                self.go_back().await?;
            }
            ScreenCommand::Home => self.navigate(Route::Home.to_request()).await?,
            ScreenCommand::Quit => return Ok(Flow::Quit),
            ScreenCommand::Show | ScreenCommand::Help => {}
        }
        Ok(Flow::Continue)
    }

    /// Failures reported by the session since the last call
    pub fn take_failures(&mut self) -> Vec<PlaybackError> {
        let Some(active) = self.session.as_mut() else {
            return Vec::new();
        };

        let mut failures = Vec::new();
        loop {
            match active.notices.try_recv() {
                Ok(notice) => failures.extend(notice.error()),
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(missed, "Session notices dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        failures
    }

    /// Render the current screen
    pub fn render(&self) -> Result<String> {
        match self.router.current() {
            Route::Home => Ok(screens::render_home(self.library.catalogs())),
            Route::TrackList { category } => {
                Ok(screens::render_track_list(&self.library.category(category)?))
            }
            Route::AllTracks => Ok(screens::render_track_list(
                &self.library.catalogs().all_tracks(),
            )),
            Route::NowPlaying { .. } => {
                let session = self.session().ok_or(AppError::NoSession)?;
                Ok(screens::render_now_playing(&session.snapshot()))
            }
        }
    }

    /// Close the session; playback keeps going
    pub async fn shutdown(&mut self) {
        self.end_session().await;
    }

    fn prepare(&self, route: &Route) -> Result<Option<PlayQueue>> {
        match route {
            Route::TrackList { category } => {
                self.library.category(category)?;
                Ok(None)
            }
            Route::NowPlaying {
                category,
                selected_index,
            } => self.build_queue(category, *selected_index).map(Some),
            Route::Home | Route::AllTracks => Ok(None),
        }
    }

    fn build_queue(&self, category: &CategoryId, selected_index: usize) -> Result<PlayQueue> {
        let catalog = self.library.category(category)?;
        Ok(PlayQueue::build(catalog.tracks(), selected_index)?)
    }

    fn start_session(&mut self, category: CategoryId, selected_index: usize, queue: PlayQueue) {
        let mut config = self.config.sync_config();
        config.player = self.library.player_options(&category, &self.config.player);

        info!(
            category = %category,
            selected_index,
            queue_len = queue.len(),
            repeat_mode = %config.player.repeat_mode,
            "Opening now playing"
        );
        let handle = spawn_session(Arc::clone(&self.player), queue, config);
        let notices = handle.notices();
        self.session = Some(ActiveSession {
            category,
            selected_index,
            handle,
            notices,
        });
    }

    async fn end_session(&mut self) {
        let Some(active) = self.session.take() else {
            return;
        };
        info!(category = %active.category, "Leaving now playing");
        if let Err(e) = active.handle.close().await {
            warn!(error = %e, "Session did not close cleanly");
        }
    }
}
