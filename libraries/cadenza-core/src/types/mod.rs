mod catalog;
mod ids;
mod navigation;
mod player;
mod track;

pub use catalog::{Catalog, CatalogSet, ALL_TRACKS_CATEGORY};
pub use ids::{CategoryId, MediaRef, TrackId};
pub use navigation::NavigationRequest;
pub use player::{Capability, PlayerEvent, PlayerOptions, PlayerState, RepeatMode};
pub use track::TrackDescriptor;
