//! silhouette_song — interactive entry point.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use silhouette_midi::{note_name, GeneralMidi};
use silhouette_play::app::{self, Session};
use silhouette_play::command::{spawn_command_source, StdinCommands, HELP};
use silhouette_play::config::{AppConfig, ToneBackend};
use silhouette_play::cycle::{Composer, SilhouetteSource};
use silhouette_play::scheduler::{PassOutcome, PlaybackScheduler};
use silhouette_play::sources::{FileSilhouettes, ProceduralSilhouettes};
use silhouette_play::tone::{MidiTone, SilentTone, TonePlayer};

#[derive(Parser, Debug)]
#[command(name = "silhouette_song", about = "Compose a melody onto a silhouette and play it back")]
struct Args {
    /// Prompt to compose right away.
    prompt: Option<String>,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use this image as the silhouette instead of drawing one.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Placement seed (overrides the config file).
    #[arg(long)]
    seed: Option<u64>,

    /// Canvas side length in pixels.
    #[arg(long)]
    side: Option<u32>,

    /// Sampling grid spacing in pixels.
    #[arg(long)]
    step: Option<u32>,

    /// Tempo in BPM.
    #[arg(long)]
    tempo: Option<u32>,

    /// Tone backend.
    #[arg(long, value_enum)]
    tone: Option<ToneBackend>,

    /// Print the composition as JSON after composing.
    #[arg(long)]
    json: bool,

    /// Write the composition here (`.mid` or `.json`) after composing.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Compose, play once and exit instead of reading commands.
    #[arg(long, requires = "prompt")]
    once: bool,
}

impl Args {
    fn config(&self) -> Result<AppConfig> {
        let mut cfg = match &self.config {
            Some(path) => AppConfig::load(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => AppConfig::default(),
        };
        if let Some(seed)  = self.seed  { cfg.seed = Some(seed); }
        if let Some(side)  = self.side  { cfg.side = side; }
        if let Some(step)  = self.step  { cfg.step = step; }
        if let Some(tempo) = self.tempo { cfg.tempo_bpm = tempo; }
        if let Some(tone)  = self.tone  { cfg.tone = tone; }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let cfg = args.config()?;

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Silhouette Song — notes placed on a shape           ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let silhouettes: Box<dyn SilhouetteSource> = match &args.image {
        Some(path) => {
            println!("  Silhouette: {}", path.display());
            Box::new(FileSilhouettes::new(path))
        }
        None => {
            println!("  Silhouette: drawn from the prompt");
            Box::new(ProceduralSilhouettes::new(cfg.side))
        }
    };

    let (tone, tone_desc): (Box<dyn TonePlayer>, &str) = match cfg.tone {
        ToneBackend::Midi => {
            let midi = MidiTone::open(cfg.midi_settings());
            let desc = if midi.is_connected() { "MIDI" } else { "silent (no MIDI port)" };
            (Box::new(midi), desc)
        }
        ToneBackend::Silent => (Box::new(SilentTone), "silent"),
    };
    println!("  Tone: {} ({})   Tempo: {} BPM   Scale: {:?} from {}",
        tone_desc, GeneralMidi::name_for(cfg.instrument), cfg.tempo_bpm, cfg.scale, note_name(cfg.root));
    println!("  Grid: every {}px on a {}px canvas", cfg.step, cfg.side);
    println!();

    let composer = Composer::new(silhouettes, cfg.melody_composer(), cfg.sampler()?, cfg.rng());
    let mut session = Session::new(composer, PlaybackScheduler::spawn(tone), cfg.midi_settings());

    if let Some(prompt) = &args.prompt {
        if session.submit(prompt).is_err() && args.once {
            bail!("{}", session.status);
        }
        println!("  {}", session.status);

        if args.json {
            if let Some(comp) = session.composition() {
                println!("{}", serde_json::to_string_pretty(comp)?);
            }
        }
        if let Some(path) = &args.export {
            session.export(path)
                .with_context(|| format!("Failed to export: {}", path.display()))?;
            println!("  {}", session.status);
        }
    }

    if args.once {
        match app::play_through(&mut session) {
            Some(PassOutcome::Failed(e)) => bail!("playback failed: {e}"),
            Some(outcome) => info!(?outcome, "done"),
            None => println!("  {}", session.status),
        }
        return Ok(());
    }

    println!("{HELP}");
    println!();
    let commands = spawn_command_source(StdinCommands);
    app::run(&mut session, commands);
    Ok(())
}
