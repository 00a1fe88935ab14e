/// Catalog domain types
use crate::error::{CoreError, Result};
use crate::types::{CategoryId, TrackDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Category id of the derived "all tracks" listing
pub const ALL_TRACKS_CATEGORY: &str = "all";

/// Static ordered list of tracks for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Category identifier
    pub id: CategoryId,

    /// Display title of the category
    pub title: String,

    /// Tracks in display order
    #[serde(default)]
    pub tracks: Vec<TrackDescriptor>,
}

impl Catalog {
    /// Create a validated catalog
    ///
    /// # Errors
    /// Returns an error if two tracks share an id
    pub fn new(
        id: CategoryId,
        title: impl Into<String>,
        tracks: Vec<TrackDescriptor>,
    ) -> Result<Self> {
        let catalog = Self {
            id,
            title: title.into(),
            tracks,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check that track ids are unique
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.tracks.len());
        for track in &self.tracks {
            if !seen.insert(&track.id) {
                return Err(CoreError::catalog(format!(
                    "duplicate track id '{}' in category '{}'",
                    track.id, self.id
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrackDescriptor> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[TrackDescriptor] {
        &self.tracks
    }
}

/// Every category known to the application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSet {
    /// Categories in menu order
    #[serde(default)]
    pub categories: Vec<Catalog>,
}

impl CatalogSet {
    /// Create a validated catalog set
    ///
    /// # Errors
    /// Returns an error on duplicate category ids, on a category using the
    /// reserved `all` id, or on duplicate track ids within a category
    pub fn new(categories: Vec<Catalog>) -> Result<Self> {
        let set = Self { categories };
        set.validate()?;
        Ok(set)
    }

    /// Validate every category and the uniqueness of category ids
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.categories.len());
        for catalog in &self.categories {
            if catalog.id.as_str() == ALL_TRACKS_CATEGORY {
                return Err(CoreError::catalog(format!(
                    "category id '{}' is reserved",
                    ALL_TRACKS_CATEGORY
                )));
            }
            if !seen.insert(&catalog.id) {
                return Err(CoreError::catalog(format!(
                    "duplicate category id '{}'",
                    catalog.id
                )));
            }
            catalog.validate()?;
        }
        Ok(())
    }

    /// Look up a category; `all` resolves to the combined listing
    pub fn get(&self, id: &CategoryId) -> Option<Catalog> {
        if id.as_str() == ALL_TRACKS_CATEGORY {
            return Some(self.all_tracks());
        }
        self.categories.iter().find(|c| &c.id == id).cloned()
    }

    /// Like [`get`](Self::get) but with a not-found error
    pub fn require(&self, id: &CategoryId) -> Result<Catalog> {
        self.get(id)
            .ok_or_else(|| CoreError::not_found("Category", id.as_str()))
    }

    /// Every track of every category, in category order
    ///
    /// A track id appearing in several categories is listed once, at its
    /// first occurrence.
    pub fn all_tracks(&self) -> Catalog {
        let mut seen = HashSet::new();
        let tracks = self
            .categories
            .iter()
            .flat_map(|c| c.tracks.iter())
            .filter(|t| seen.insert(t.id.clone()))
            .cloned()
            .collect();

        Catalog {
            id: CategoryId::new(ALL_TRACKS_CATEGORY),
            title: "All tracks".to_string(),
            tracks,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Catalog> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
