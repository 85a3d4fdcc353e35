//! Random, collision-avoiding assignment of notes to candidate spots.
//!
//! For note `i` of `N` a spot is drawn uniformly from the working list.
//! The spot is struck from the list only while the list is longer than the
//! number of notes still waiting after this one.  With at least as many
//! spots as notes every note gets its own spot; with fewer, every note is
//! still placed and the surplus reuses spots.

use rand::Rng;
use tracing::debug;

use crate::error::{MapError, Result};
use crate::{Coordinate, Note, PlacedNote};

#[derive(Clone, Copy, Debug, Default)]
pub struct NotePlacer;

impl NotePlacer {
    /// Place every note of `notes` on one of `spots`.
    ///
    /// The output has exactly `notes.len()` entries in input order.  `spots`
    /// is copied; the caller's list is never modified.
    pub fn place<R: Rng>(
        &self,
        notes: &[Note],
        spots: &[Coordinate],
        rng:   &mut R,
    ) -> Result<Vec<PlacedNote>> {
        if spots.is_empty() {
            return Err(MapError::EmptyCandidateSet);
        }

        let mut available = spots.to_vec();
        let mut placed = Vec::with_capacity(notes.len());

        for (index, note) in notes.iter().enumerate() {
            let pick = rng.random_range(0..available.len());
            let spot = available[pick];

            let waiting = notes.len() - index - 1;
            if available.len() > waiting {
                available.remove(pick);
            }

            placed.push(PlacedNote::new(note.clone(), placement_id(index, rng), spot));
        }

        debug!(notes = notes.len(), spots = spots.len(), "placed notes");
        Ok(placed)
    }
}

/// `"<index>-<random hex>"`; the index prefix alone keeps ids unique.
fn placement_id<R: Rng>(index: usize, rng: &mut R) -> String {
    format!("{}-{:08x}", index, rng.random::<u32>())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
