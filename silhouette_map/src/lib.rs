//! # silhouette_map
//!
//! Binds a melody to the visible area of a silhouette image.
//!
//! * [`SpotSampler`] scans an S×S raster on a coarse grid and keeps the
//!   grid points that are not near-white.
//! * [`NotePlacer`] assigns every note of a melody to one of those spots,
//!   avoiding reuse for as long as there are spare spots.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use rand::SeedableRng;
//! use rand_pcg::Pcg64;
//! use silhouette_map::{raster, Note, NotePlacer, SpotSampler};
//!
//! let canvas = raster::load_square("cat.png".as_ref(), raster::DEFAULT_SIDE).unwrap();
//! let spots  = SpotSampler::default().sample(&canvas).unwrap();
//!
//! let melody = vec![
//!     Note::new("C4", 261.63, 0.5),
//!     Note::new("E4", 329.63, 0.5),
//!     Note::new("G4", 392.00, 1.0),
//! ];
//! let mut rng = Pcg64::seed_from_u64(7);
//! let placed  = NotePlacer.place(&melody, &spots, &mut rng).unwrap();
//! assert_eq!(placed.len(), 3);
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub mod error;
pub mod placer;
pub mod raster;
pub mod sampler;

pub use error::{MapError, Result};
pub use placer::NotePlacer;
pub use sampler::SpotSampler;

// ════════════════════════════════════════════════════════════════════════════
// Note — one melody event, as produced by a melody source
// ════════════════════════════════════════════════════════════════════════════

/// A single melody note.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Display label, usually a pitch name such as `"C4"`.
    pub value:     String,
    /// Pitch in Hz.
    pub frequency: f64,
    /// Length in seconds.
    pub duration:  f64,
}

impl Note {
    pub fn new(value: impl Into<String>, frequency: f64, duration: f64) -> Self {
        Note { value: value.into(), frequency, duration }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Coordinate — a pixel position inside the S×S raster
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: u32,
    pub y: u32,
}

impl Coordinate {
    pub fn new(x: u32, y: u32) -> Self { Coordinate { x, y } }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PlacedNote — a note bound to a spot for one generation cycle
// ════════════════════════════════════════════════════════════════════════════

/// A [`Note`] pinned to a [`Coordinate`].
///
/// `id` is unique within the cycle that produced it, even when two notes
/// share a coordinate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacedNote {
    #[serde(flatten)]
    pub note: Note,
    pub id:   String,
    pub x:    u32,
    pub y:    u32,
}

impl PlacedNote {
    pub fn new(note: Note, id: String, at: Coordinate) -> Self {
        PlacedNote { note, id, x: at.x, y: at.y }
    }

    pub fn coordinate(&self) -> Coordinate { Coordinate::new(self.x, self.y) }
}

// ════════════════════════════════════════════════════════════════════════════
// prompt_seed — stable RNG seed for a text prompt
// ════════════════════════════════════════════════════════════════════════════

/// Derive a 64-bit seed from a prompt.
///
/// The same prompt always yields the same seed, across runs and platforms.
pub fn prompt_seed(prompt: &str) -> u64 {
    let digest = Sha256::digest(prompt.trim().as_bytes());
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
