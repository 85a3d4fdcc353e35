//! Samples a drawn disc and pins a short melody onto it.

use std::collections::HashSet;

use image::{Rgba, RgbaImage};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use silhouette_map::{prompt_seed, Coordinate, MapError, Note, NotePlacer, SpotSampler};

fn disc(side: u32, radius: u32) -> RgbaImage {
    let c = side as i64 / 2;
    let r2 = (radius as i64).pow(2);
    RgbaImage::from_fn(side, side, |x, y| {
        let (dx, dy) = (x as i64 - c, y as i64 - c);
        if dx * dx + dy * dy <= r2 { Rgba([30, 30, 60, 255]) } else { Rgba([255, 255, 255, 255]) }
    })
}

fn melody(n: usize) -> Vec<Note> {
    const LABELS: [(&str, f64); 5] =
        [("C4", 261.63), ("D4", 293.66), ("E4", 329.63), ("G4", 392.00), ("A4", 440.00)];
    (0..n).map(|i| {
        let (label, hz) = LABELS[i % LABELS.len()];
        Note::new(label, hz, 0.5)
    }).collect()
}

fn main() -> silhouette_map::Result<()> {
    println!("\n=== Silhouette Spot Demo ===\n");
    let sampler = SpotSampler::default();

    // ── 1. Sample a disc ──────────────────────────────────────────────────
    println!("1. Disc of radius 120 on a {0}×{0} canvas, step {1}", sampler.side(), sampler.step());
    let spots = sampler.sample(&disc(sampler.side(), 120))?;
    println!("   {} of {} grid points are inside the shape", spots.len(), sampler.grid().count());
    println!("   first: {}\n", spots.iter().take(5).map(Coordinate::to_string).collect::<Vec<_>>().join(" "));

    // ── 2. Fewer notes than spots: all distinct ───────────────────────────
    println!("2. Eight notes, seeded from the prompt \"a full moon\"");
    let mut rng = Pcg64::seed_from_u64(prompt_seed("a full moon"));
    let placed = NotePlacer.place(&melody(8), &spots, &mut rng)?;
    for p in &placed {
        println!("   {:<10} {:<3} at {}", p.id, p.note.value, p.coordinate());
    }
    let distinct: HashSet<_> = placed.iter().map(|p| p.coordinate()).collect();
    println!("   {} distinct spots\n", distinct.len());

    // ── 3. More notes than spots: reuse ───────────────────────────────────
    println!("3. Six notes on a three-spot shape");
    let few = [Coordinate::new(15, 15), Coordinate::new(30, 15), Coordinate::new(15, 30)];
    let placed = NotePlacer.place(&melody(6), &few, &mut rng)?;
    let at: Vec<String> = placed.iter().map(|p| p.coordinate().to_string()).collect();
    println!("   {}\n", at.join(" "));

    // ── 4. Nothing visible ────────────────────────────────────────────────
    println!("4. Blank canvas");
    let blank = RgbaImage::from_pixel(sampler.side(), sampler.side(), Rgba([255, 255, 255, 255]));
    match sampler.sample(&blank) {
        Err(MapError::NoVisibleShape) => println!("   no visible shape, nothing to place"),
        other => println!("   unexpected: {other:?}"),
    }
    println!();
    Ok(())
}
