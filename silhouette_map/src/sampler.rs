//! Grid sampling of a silhouette raster.
//!
//! The sampler walks a coarse grid (every `step` pixels, keeping a `step`
//! margin on every side) and keeps the grid points whose pixel is *not*
//! near-white.  A coarse grid keeps the candidate set small and spreads the
//! spots evenly over the shape.

use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::error::{MapError, Result};
use crate::raster::DEFAULT_SIDE;
use crate::Coordinate;

/// Grid spacing, in pixels.
pub const DEFAULT_STEP: u32 = 15;

/// A pixel whose R, G and B are all at or above this value is background.
pub const DEFAULT_THRESHOLD: u8 = 248;

// ════════════════════════════════════════════════════════════════════════════
// SpotSampler
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpotSampler {
    side:      u32,
    step:      u32,
    threshold: u8,
}

impl Default for SpotSampler {
    fn default() -> Self {
        SpotSampler { side: DEFAULT_SIDE, step: DEFAULT_STEP, threshold: DEFAULT_THRESHOLD }
    }
}

impl SpotSampler {
    /// Sampler for a `side`×`side` raster with the given grid `step`.
    ///
    /// Fails if the grid would be empty.
    pub fn new(side: u32, step: u32) -> Result<Self> {
        if step == 0 || side <= step.saturating_mul(2) {
            return Err(MapError::InvalidGrid { side, step });
        }
        Ok(SpotSampler { side, step, threshold: DEFAULT_THRESHOLD })
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn side(&self)      -> u32 { self.side }
    pub fn step(&self)      -> u32 { self.step }
    pub fn threshold(&self) -> u8  { self.threshold }

    /// True if the pixel belongs to the shape rather than the background.
    pub fn is_visible(&self, px: &Rgba<u8>) -> bool {
        let [r, g, b, _] = px.0;
        r < self.threshold || g < self.threshold || b < self.threshold
    }

    /// Every grid point, row-major, regardless of pixel content.
    pub fn grid(&self) -> impl Iterator<Item = Coordinate> {
        let (lo, hi, step) = (self.step, self.side - self.step, self.step as usize);
        (lo..hi).step_by(step).flat_map(move |y| {
            (lo..hi).step_by(step).map(move |x| Coordinate::new(x, y))
        })
    }

    /// Collect the visible grid points of `raster`.
    ///
    /// Returns [`MapError::NoVisibleShape`] when nothing is visible, and
    /// [`MapError::RasterSize`] when the raster is not `side`×`side`.
    pub fn sample(&self, raster: &RgbaImage) -> Result<Vec<Coordinate>> {
        let (width, height) = raster.dimensions();
        if width != self.side || height != self.side {
            return Err(MapError::RasterSize { width, height, side: self.side });
        }

        let spots: Vec<Coordinate> = self.grid()
            .filter(|c| self.is_visible(raster.get_pixel(c.x, c.y)))
            .collect();

        debug!(side = self.side, step = self.step, spots = spots.len(), "sampled raster");

        if spots.is_empty() {
            return Err(MapError::NoVisibleShape);
        }
        Ok(spots)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
