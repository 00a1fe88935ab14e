//! Rotated play queue
//!
//! The player is always loaded with the selected track first:
//!
//! ```text
//! catalog:        [A, B, C, D]
//! selected:              ^ (2)
//! play queue:     [C, D, A, B]
//! ```
//!
//! Queue positions are what the player and the carousel talk about; the
//! catalog position is only needed to map back to the list screen.

use crate::error::InvalidQueueError;
use cadenza_core::TrackDescriptor;

/// Catalog rotated so the selected track plays first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayQueue {
    /// Tracks in play order
    tracks: Vec<TrackDescriptor>,

    /// Catalog position of `tracks[0]`
    start_index: usize,
}

impl PlayQueue {
    /// Build a queue from a catalog and the selected start index
    ///
    /// `output[i] == catalog[(start_index + i) % catalog.len()]`
    ///
    /// # Errors
    /// Returns `InvalidQueueError` for an empty catalog or a start index
    /// outside it.
    pub fn build(
        catalog: &[TrackDescriptor],
        start_index: usize,
    ) -> Result<Self, InvalidQueueError> {
        if catalog.is_empty() {
            return Err(InvalidQueueError::EmptyCatalog);
        }
        if start_index >= catalog.len() {
            return Err(InvalidQueueError::StartIndexOutOfRange {
                index: start_index,
                len: catalog.len(),
            });
        }

        let mut tracks = Vec::with_capacity(catalog.len());
        tracks.extend_from_slice(&catalog[start_index..]);
        tracks.extend_from_slice(&catalog[..start_index]);

        Ok(Self {
            tracks,
            start_index,
        })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Always false for a built queue; kept for API symmetry
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrackDescriptor> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[TrackDescriptor] {
        &self.tracks
    }

    /// Catalog position the queue was started from
    pub fn start_index(&self) -> usize {
        self.start_index
    }

    /// Map a queue position back to its catalog position
    pub fn catalog_index(&self, queue_index: usize) -> Option<usize> {
        (queue_index < self.len()).then(|| (self.start_index + queue_index) % self.len())
    }

    /// Next position, wrapping to the first track
    pub fn wrap_next(&self, index: usize) -> usize {
        (index + 1) % self.len()
    }

    /// Previous position, wrapping to the last track
    pub fn wrap_previous(&self, index: usize) -> usize {
        (index + self.len() - 1) % self.len()
    }

    pub fn contains_index(&self, index: usize) -> bool {
        index < self.len()
    }
}

/// Build a play queue (free-function form)
pub fn build(
    catalog: &[TrackDescriptor],
    start_index: usize,
) -> Result<PlayQueue, InvalidQueueError> {
    PlayQueue::build(catalog, start_index)
}
