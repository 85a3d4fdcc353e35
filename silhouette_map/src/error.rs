use thiserror::Error;

/// Failures while turning a raster and a melody into placed notes.
#[derive(Debug, Error)]
pub enum MapError {
    /// Sampling found no non-background pixel inside the margin.
    #[error("no visible shape inside the sampling margin")]
    NoVisibleShape,

    /// Placement was handed zero candidate spots.
    #[error("no candidate spots to place notes on")]
    EmptyCandidateSet,

    #[error("raster is {width}x{height}, expected {side}x{side}")]
    RasterSize { width: u32, height: u32, side: u32 },

    /// The grid would contain no points (`step == 0` or `side <= 2 * step`).
    #[error("sampling step {step} leaves no grid inside a {side}px raster")]
    InvalidGrid { side: u32, step: u32 },

    #[error("could not decode silhouette image: {0}")]
    Decode(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, MapError>;
