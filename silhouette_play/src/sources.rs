//! Local collaborators that work offline.
//!
//! * [`ProceduralSilhouettes`] — a prompt-seeded blob of overlapping black
//!   ellipses on white.
//! * [`FileSilhouettes`] — an image from disk, whatever the prompt.
//! * [`MelodyComposer`] — the scale-walk melody from `silhouette_midi`.

use std::path::PathBuf;

use image::{DynamicImage, Rgb, RgbImage};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use tracing::debug;

use silhouette_map::{prompt_seed, Note};
use silhouette_midi::MelodyComposer;

use crate::cycle::{GenerationError, MelodySource, SilhouetteSource};

/// Mixed into the prompt seed so shape and melody don't draw the same numbers.
const SHAPE_SALT: u64 = 0x5117_0e77_e5ba_de00;

// ════════════════════════════════════════════════════════════════════════════
// ProceduralSilhouettes
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug)]
struct Ellipse {
    cx: f64,
    cy: f64,
    rx: f64,
    ry: f64,
}

impl Ellipse {
    fn contains(&self, x: f64, y: f64) -> bool {
        let dx = (x - self.cx) / self.rx;
        let dy = (y - self.cy) / self.ry;
        dx * dx + dy * dy <= 1.0
    }
}

/// Draws a silhouette from nothing but the prompt.
///
/// Every ellipse is centred in the middle 40% of the canvas with radii of
/// at least 8% of the side, so the shape always covers part of the
/// sampling grid.
#[derive(Clone, Copy, Debug)]
pub struct ProceduralSilhouettes {
    side: u32,
}

impl ProceduralSilhouettes {
    pub fn new(side: u32) -> Self { ProceduralSilhouettes { side: side.max(1) } }

    fn ellipses(&self, prompt: &str) -> Vec<Ellipse> {
        let mut rng = Pcg64::seed_from_u64(prompt_seed(prompt) ^ SHAPE_SALT);
        let s = self.side as f64;
        let count = rng.random_range(3..=7);
        (0..count).map(|_| Ellipse {
            cx: rng.random_range(0.3..0.7) * s,
            cy: rng.random_range(0.3..0.7) * s,
            rx: rng.random_range(0.08..0.25) * s,
            ry: rng.random_range(0.08..0.25) * s,
        }).collect()
    }
}

impl SilhouetteSource for ProceduralSilhouettes {
    fn generate_silhouette(&mut self, prompt: &str) -> Result<DynamicImage, GenerationError> {
        if prompt.trim().is_empty() {
            return Err(GenerationError::Silhouette("the prompt is empty".into()));
        }
        let blobs = self.ellipses(prompt);
        debug!(prompt, blobs = blobs.len(), "drawing procedural silhouette");

        let img = RgbImage::from_fn(self.side, self.side, |x, y| {
            let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
            if blobs.iter().any(|e| e.contains(px, py)) {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        Ok(DynamicImage::ImageRgb8(img))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FileSilhouettes
// ════════════════════════════════════════════════════════════════════════════

/// Uses the same image file for every prompt.
#[derive(Clone, Debug)]
pub struct FileSilhouettes {
    path: PathBuf,
}

impl FileSilhouettes {
    pub fn new(path: impl Into<PathBuf>) -> Self { FileSilhouettes { path: path.into() } }
}

impl SilhouetteSource for FileSilhouettes {
    fn generate_silhouette(&mut self, _prompt: &str) -> Result<DynamicImage, GenerationError> {
        image::open(&self.path)
            .map_err(|e| GenerationError::Silhouette(format!("{}: {}", self.path.display(), e)))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MelodyComposer as a MelodySource
// ════════════════════════════════════════════════════════════════════════════

impl MelodySource for MelodyComposer {
    fn generate_melody(&mut self, prompt: &str) -> Result<Vec<Note>, GenerationError> {
        if prompt.trim().is_empty() {
            return Err(GenerationError::Melody("the prompt is empty".into()));
        }
        Ok(self.compose(prompt))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
