/// Track domain type
use crate::types::{MediaRef, TrackId};
use serde::{Deserialize, Serialize};

/// Immutable description of a playable track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    /// Unique track identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Artwork handle for the carousel page
    pub artwork: MediaRef,

    /// Audio handle passed to the player
    pub audio: MediaRef,

    /// Optional region/category flag shown next to the title
    #[serde(default, alias = "flag", skip_serializing_if = "Option::is_none")]
    pub category_flag: Option<String>,
}

impl TrackDescriptor {
    /// Create a track without a category flag
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        artwork: MediaRef,
        audio: MediaRef,
    ) -> Self {
        Self {
            id: TrackId::new(id),
            title: title.into(),
            artist: artist.into(),
            artwork,
            audio,
            category_flag: None,
        }
    }

    /// Attach a category flag
    #[must_use]
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.category_flag = Some(flag.into());
        self
    }
}
