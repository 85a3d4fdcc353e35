//! One generation cycle: prompt → silhouette + melody → placed notes.
//!
//! The two generators are collaborators behind traits; [`Composer`] only
//! renders, samples and places.  A cycle either yields a complete
//! [`Composition`] or an error; there is no partially placed result.

use image::{DynamicImage, RgbaImage};
use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use silhouette_map::{raster, Coordinate, MapError, Note, NotePlacer, PlacedNote, SpotSampler};

// ════════════════════════════════════════════════════════════════════════════
// Collaborator traits
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("could not create a silhouette: {0}")]
    Silhouette(String),

    #[error("could not create a melody: {0}")]
    Melody(String),
}

/// Turns a prompt into an image of some shape on a light background.
pub trait SilhouetteSource {
    fn generate_silhouette(&mut self, prompt: &str) -> Result<DynamicImage, GenerationError>;
}

/// Turns a prompt into a sequence of notes.
pub trait MelodySource {
    fn generate_melody(&mut self, prompt: &str) -> Result<Vec<Note>, GenerationError>;
}

impl<T: SilhouetteSource + ?Sized> SilhouetteSource for Box<T> {
    fn generate_silhouette(&mut self, prompt: &str) -> Result<DynamicImage, GenerationError> {
        (**self).generate_silhouette(prompt)
    }
}

impl<T: MelodySource + ?Sized> MelodySource for Box<T> {
    fn generate_melody(&mut self, prompt: &str) -> Result<Vec<Note>, GenerationError> {
        (**self).generate_melody(prompt)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CycleError
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("the silhouette has no visible shape")]
    NoVisibleShape,

    #[error("no spots to place notes on")]
    EmptyCandidateSet,

    #[error(transparent)]
    Map(MapError),
}

impl From<MapError> for CycleError {
    fn from(e: MapError) -> Self {
        match e {
            MapError::NoVisibleShape    => CycleError::NoVisibleShape,
            MapError::EmptyCandidateSet => CycleError::EmptyCandidateSet,
            other                       => CycleError::Map(other),
        }
    }
}

impl CycleError {
    /// One line suitable for showing to whoever typed the prompt.
    pub fn user_message(&self) -> String {
        match self {
            CycleError::Generation(e) => format!("{e}. Please try again."),
            CycleError::NoVisibleShape | CycleError::EmptyCandidateSet =>
                "Couldn't find a shape to put the notes on. Try a simpler prompt.".to_string(),
            CycleError::Map(e) => format!("Something went wrong: {e}"),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Composition — the result of one cycle
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Serialize)]
pub struct Composition {
    pub prompt: String,
    pub side:   u32,
    /// The S×S canvas the spots were sampled from.
    #[serde(skip)]
    pub raster: RgbaImage,
    pub spots:  Vec<Coordinate>,
    pub placed: Vec<PlacedNote>,
}

impl Composition {
    /// The melody in playing order.
    pub fn melody(&self) -> Vec<Note> {
        self.placed.iter().map(|p| p.note.clone()).collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Composer
// ════════════════════════════════════════════════════════════════════════════

pub struct Composer<S, M, R> {
    silhouettes: S,
    melodies:    M,
    sampler:     SpotSampler,
    placer:      NotePlacer,
    rng:         R,
}

impl<S, M, R> Composer<S, M, R>
where
    S: SilhouetteSource,
    M: MelodySource,
    R: Rng,
{
    pub fn new(silhouettes: S, melodies: M, sampler: SpotSampler, rng: R) -> Self {
        Composer { silhouettes, melodies, sampler, placer: NotePlacer, rng }
    }

    /// Run a full cycle for `prompt`.
    pub fn run_generation_cycle(&mut self, prompt: &str) -> Result<Composition, CycleError> {
        info!(prompt, "generation cycle started");

        let image  = self.silhouettes.generate_silhouette(prompt)?;
        let melody = self.melodies.generate_melody(prompt)?;

        let side   = self.sampler.side();
        let canvas = raster::render_square(&image, side);
        let spots  = self.sampler.sample(&canvas).inspect_err(|e| warn!("sampling failed: {}", e))?;
        let placed = self.placer.place(&melody, &spots, &mut self.rng)?;

        info!(spots = spots.len(), notes = placed.len(), "generation cycle finished");
        Ok(Composition { prompt: prompt.to_string(), side, raster: canvas, spots, placed })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
