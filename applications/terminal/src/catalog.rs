//! Catalog loading
//!
//! Catalogs are static TOML documents:
//!
//! ```toml
//! [[categories]]
//! id = "dites"
//! title = "Dites"
//! repeat_mode = "track"   # optional
//!
//! [[categories.tracks]]
//! id = "dites-abril"
//! title = "A l'abril, cada gota val per mil"
//! artist = "Dita popular"
//! artwork = "artwork/dites/abril.webp"
//! audio = "audio/dites/abril.mp3"
//! flag = "CAT"            # optional
//! ```

use crate::error::{AppError, Result};
use cadenza_core::{Catalog, CatalogSet, CategoryId, PlayerOptions, RepeatMode, TrackDescriptor};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

const BUILTIN_CATALOG: &str = include_str!("../assets/catalog.toml");

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    categories: Vec<CategoryEntry>,
}

#[derive(Debug, Deserialize)]
struct CategoryEntry {
    id: CategoryId,
    title: String,
    #[serde(default)]
    repeat_mode: Option<RepeatMode>,
    #[serde(default)]
    tracks: Vec<TrackDescriptor>,
}

/// Every category plus per-category player overrides
#[derive(Debug, Clone)]
pub struct Library {
    catalogs: CatalogSet,
    repeat_modes: HashMap<CategoryId, RepeatMode>,
}

impl Library {
    /// Parse a TOML catalog
    pub fn parse(source: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(source)?;

        let mut repeat_modes = HashMap::new();
        let mut categories = Vec::with_capacity(file.categories.len());
        for entry in file.categories {
            if entry.tracks.is_empty() {
                return Err(AppError::Catalog(format!(
                    "category '{}' has no tracks",
                    entry.id
                )));
            }
            if let Some(mode) = entry.repeat_mode {
                repeat_modes.insert(entry.id.clone(), mode);
            }
            categories.push(Catalog::new(entry.id, entry.title, entry.tracks)?);
        }

        let catalogs = CatalogSet::new(categories)?;
        if catalogs.is_empty() {
            return Err(AppError::Catalog("catalog has no categories".to_string()));
        }

        debug!(
            categories = catalogs.len(),
            tracks = catalogs.all_tracks().len(),
            "Catalog parsed"
        );
        Ok(Self {
            catalogs,
            repeat_modes,
        })
    }

    /// Load a catalog file
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        let library = Self::parse(&source)
            .map_err(|e| AppError::Catalog(format!("{}: {}", path.display(), e)))?;
        info!("Loaded catalog from {}", path.display());
        Ok(library)
    }

    /// Catalog shipped with the application
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_CATALOG)
    }

    /// Load `path` when configured, the built-in catalog otherwise
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    pub fn catalogs(&self) -> &CatalogSet {
        &self.catalogs
    }

    /// Look up a category (`all` resolves to every track)
    pub fn category(&self, id: &CategoryId) -> Result<Catalog> {
        Ok(self.catalogs.require(id)?)
    }

    /// Repeat mode pinned by a category, if any
    pub fn repeat_mode(&self, id: &CategoryId) -> Option<RepeatMode> {
        self.repeat_modes.get(id).copied()
    }

    /// Player options for a category, starting from `base`
    pub fn player_options(&self, id: &CategoryId, base: &PlayerOptions) -> PlayerOptions {
        let mut options = base.clone();
        if let Some(mode) = self.repeat_mode(id) {
            options.repeat_mode = mode;
        }
        options
    }
}
