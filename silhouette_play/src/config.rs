//! Application configuration.
//!
//! Loaded from an optional TOML file; every field has a default, so an empty
//! file (or none at all) is valid.  Command-line flags are applied on top in
//! `main.rs`.
//!
//! ```toml
//! side          = 500
//! step          = 15
//! threshold     = 248
//! seed          = 42
//! tempo_bpm     = 96
//! instrument    = 11      # vibraphone
//! scale         = "pentatonic_minor"
//! root          = 57
//! melody_length = 24
//! tone          = "silent"
//! ```

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use silhouette_map::sampler::{DEFAULT_STEP, DEFAULT_THRESHOLD};
use silhouette_map::{raster, SpotSampler};
use silhouette_midi::{GeneralMidi, MelodyComposer, MidiSettings, PitchMap, ScaleKind};

/// Ticks per quarter note for both playback timing and MIDI export.
pub const TICKS_PER_QUARTER: u16 = 480;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

// ════════════════════════════════════════════════════════════════════════════
// ToneBackend
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ToneBackend {
    /// First available MIDI output port (silent if none).
    #[default]
    Midi,
    /// Keep time without sound.
    Silent,
}

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Canvas side length in pixels.
    pub side:          u32,
    /// Sampling grid spacing in pixels.
    pub step:          u32,
    /// Channel value at or above which a pixel is background.
    pub threshold:     u8,
    /// Fixed placement seed; random per run when absent.
    pub seed:          Option<u64>,
    pub tempo_bpm:     u32,
    /// General MIDI program number.
    pub instrument:    u8,
    pub velocity:      u8,
    pub channel:       u8,
    pub scale:         ScaleKind,
    /// MIDI note number of scale degree 0.
    pub root:          u8,
    pub melody_length: usize,
    pub tone:          ToneBackend,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            side:          raster::DEFAULT_SIDE,
            step:          DEFAULT_STEP,
            threshold:     DEFAULT_THRESHOLD,
            seed:          None,
            tempo_bpm:     120,
            instrument:    GeneralMidi::Vibraphone.program(),
            velocity:      100,
            channel:       0,
            scale:         ScaleKind::Major,
            root:          60,
            melody_length: 16,
            tone:          ToneBackend::Midi,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&text)
    }

    /// Reject settings that would make sampling or MIDI output meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step == 0 || self.side <= self.step.saturating_mul(2) {
            return Err(ConfigError::Invalid(format!(
                "step {} leaves no sampling grid on a {}px canvas", self.step, self.side
            )));
        }
        if !(20..=300).contains(&self.tempo_bpm) {
            return Err(ConfigError::Invalid(format!("tempo {} is outside 20–300 BPM", self.tempo_bpm)));
        }
        for (name, value) in [("instrument", self.instrument), ("velocity", self.velocity), ("root", self.root)] {
            if value > 127 {
                return Err(ConfigError::Invalid(format!("{name} {value} is above 127")));
            }
        }
        if self.channel > 15 {
            return Err(ConfigError::Invalid(format!("channel {} is above 15", self.channel)));
        }
        Ok(())
    }

    // ── builders ──────────────────────────────────────────────────────────

    pub fn sampler(&self) -> Result<SpotSampler, ConfigError> {
        SpotSampler::new(self.side, self.step)
            .map(|s| s.with_threshold(self.threshold))
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn melody_composer(&self) -> MelodyComposer {
        MelodyComposer::new()
            .pitch_map(PitchMap::custom(self.root, self.scale.scale()))
            .ticks_per_quarter(TICKS_PER_QUARTER)
            .tempo(self.tempo_bpm)
            .length(self.melody_length)
    }

    pub fn midi_settings(&self) -> MidiSettings {
        MidiSettings {
            tempo_bpm:         self.tempo_bpm,
            ticks_per_quarter: TICKS_PER_QUARTER,
            instrument:        self.instrument,
            channel:           self.channel,
            velocity:          self.velocity,
        }
    }

    /// Placement RNG: seeded when `seed` is set, otherwise from the thread RNG.
    pub fn rng(&self) -> Pcg64 {
        match self.seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None       => Pcg64::from_rng(&mut rand::rng()),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
