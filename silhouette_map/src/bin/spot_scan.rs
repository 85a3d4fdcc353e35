//! spot_scan — sample an image file and report its candidate spots.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use silhouette_map::sampler::{DEFAULT_STEP, DEFAULT_THRESHOLD};
use silhouette_map::{raster, SpotSampler};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "spot_scan", about = "List the note spots an image would offer")]
struct Args {
    /// Silhouette image (PNG or JPEG).
    image: PathBuf,

    /// Canvas side length in pixels.
    #[arg(long, default_value_t = raster::DEFAULT_SIDE)]
    side: u32,

    /// Grid spacing in pixels.
    #[arg(long, default_value_t = DEFAULT_STEP)]
    step: u32,

    /// Channel value at or above which a pixel counts as background.
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: u8,

    /// Print every spot as JSON instead of a summary.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let sampler = SpotSampler::new(args.side, args.step)?.with_threshold(args.threshold);
    let canvas = raster::load_square(&args.image, args.side)
        .with_context(|| format!("Failed to load silhouette: {}", args.image.display()))?;
    let spots = sampler.sample(&canvas)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&spots)?);
        return Ok(());
    }

    let grid = sampler.grid().count();
    println!();
    println!("  {}", args.image.display());
    println!("  ├─ canvas   : {0}×{0}px, step {1}", args.side, args.step);
    println!("  ├─ coverage : {} of {} grid points ({:.1}%)",
        spots.len(), grid, 100.0 * spots.len() as f64 / grid as f64);
    let preview: Vec<String> = spots.iter().take(8).map(|c| c.to_string()).collect();
    println!("  └─ first    : {}{}", preview.join(" "), if spots.len() > 8 { " …" } else { "" });
    println!();
    Ok(())
}
