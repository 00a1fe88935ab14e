//! Cadenza Core
//!
//! Platform-agnostic core types, traits, and error handling for Cadenza.
//!
//! This crate provides the building blocks shared by the playback library and
//! the applications.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `TrackDescriptor`, `Catalog`, `CatalogSet`
//! - **Player Contract**: `PlayerAdapter`, `PlayerEvent`, `PlayerOptions`
//! - **Navigation Contract**: `Navigator`, `NavigationRequest`
//! - **Error Handling**: Unified `CoreError` and `Result` types
//!
//! The external media player itself (decoding, buffering, audio sessions) is
//! never implemented here. Platforms plug it in through [`PlayerAdapter`].
//!
//! # Example
//!
//! ```rust
//! use cadenza_core::types::{Catalog, CategoryId, MediaRef, TrackDescriptor};
//!
//! let track = TrackDescriptor::new(
//!     "dites-1",
//!     "A l'abril",
//!     "Popular",
//!     MediaRef::new("artwork/dites-1.webp"),
//!     MediaRef::new("audio/dites-1.mp3"),
//! );
//!
//! let catalog = Catalog::new(CategoryId::new("dites"), "Dites", vec![track]).unwrap();
//! assert_eq!(catalog.len(), 1);
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use traits::{Navigator, PlayerAdapter};

pub use types::{
    Capability, Catalog, CatalogSet, CategoryId, MediaRef, NavigationRequest, PlayerEvent,
    PlayerOptions, PlayerState, RepeatMode, TrackDescriptor, TrackId, ALL_TRACKS_CATEGORY,
};
