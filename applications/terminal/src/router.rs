/// Stack router for the terminal screens
use cadenza_core::{
    CategoryId, CoreError, NavigationRequest, Navigator, ALL_TRACKS_CATEGORY,
};
use tracing::debug;

pub const HOME_SCREEN: &str = "Home";
pub const TRACK_LIST_SCREEN: &str = "TrackList";
pub const ALL_TRACKS_SCREEN: &str = "AllTracks";
pub const NOW_PLAYING_SCREEN: &str = "NowPlaying";

pub const CATEGORY_PARAM: &str = "category";
pub const SELECTED_INDEX_PARAM: &str = "selectedIndex";

/// A screen with its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    TrackList { category: CategoryId },
    AllTracks,
    NowPlaying {
        category: CategoryId,
        selected_index: usize,
    },
}

impl Route {
    /// Parse a navigation request
    ///
    /// `NowPlaying` requires both `category` and `selectedIndex`; a missing
    /// index is an error rather than an implicit first track.
    pub fn from_request(request: &NavigationRequest) -> cadenza_core::Result<Self> {
        match request.screen.as_str() {
            HOME_SCREEN => Ok(Route::Home),
            ALL_TRACKS_SCREEN => Ok(Route::AllTracks),
            TRACK_LIST_SCREEN => Ok(Route::TrackList {
                category: CategoryId::new(request.str_param(CATEGORY_PARAM)?),
            }),
            NOW_PLAYING_SCREEN => Ok(Route::NowPlaying {
                category: CategoryId::new(request.str_param(CATEGORY_PARAM)?),
                selected_index: request.index_param(SELECTED_INDEX_PARAM)?,
            }),
            other => Err(CoreError::not_found("Screen", other)),
        }
    }

    /// Navigation request for this route
    pub fn to_request(&self) -> NavigationRequest {
        match self {
            Route::Home => NavigationRequest::new(HOME_SCREEN),
            Route::AllTracks => NavigationRequest::new(ALL_TRACKS_SCREEN),
            Route::TrackList { category } => NavigationRequest::new(TRACK_LIST_SCREEN)
                .with_param(CATEGORY_PARAM, category.as_str()),
            Route::NowPlaying {
                category,
                selected_index,
            } => NavigationRequest::new(NOW_PLAYING_SCREEN)
                .with_param(CATEGORY_PARAM, category.as_str())
                .with_param(SELECTED_INDEX_PARAM, *selected_index as u64),
        }
    }

    /// Category listed by a list screen
    pub fn list_category(&self) -> Option<CategoryId> {
        match self {
            Route::TrackList { category } => Some(category.clone()),
            Route::AllTracks => Some(CategoryId::new(ALL_TRACKS_CATEGORY)),
            _ => None,
        }
    }
}

/// Route stack, rooted at `Home`
#[derive(Debug, Clone)]
pub struct Router {
    stack: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            stack: vec![Route::Home],
        }
    }

    pub fn current(&self) -> &Route {
        // The root is never popped
        &self.stack[self.stack.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn routes(&self) -> &[Route] {
        &self.stack
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for Router {
    fn navigate_to(&mut self, request: NavigationRequest) -> cadenza_core::Result<()> {
        let route = Route::from_request(&request)?;
        debug!(?route, depth = self.stack.len() + 1, "Navigate");
        if route == Route::Home {
            self.stack.truncate(1);
        } else {
            self.stack.push(route);
        }
        Ok(())
    }

    fn go_back(&mut self) -> bool {
        if self.stack.len() <= 1 {
            return false;
        }
        let left = self.stack.pop();
        debug!(?left, "Back");
        true
    }
}
