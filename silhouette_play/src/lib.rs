//! # silhouette_play
//!
//! Turns a text prompt into a *silhouette song*: a shape and a melody are
//! generated from the prompt, every note is pinned to a spot inside the
//! shape, and the notes are performed one at a time while their spots are
//! highlighted.
//!
//! ## Pieces
//!
//! | Module | Role |
//! |---|---|
//! | [`cycle`] | `Composer::run_generation_cycle` — generate, render, sample, place |
//! | [`scheduler`] | `PlaybackScheduler` — one cancelable pass at a time on a worker thread |
//! | [`tone`] | `TonePlayer` backends: MIDI output or silent timing |
//! | [`sources`] | Offline silhouette and melody generators |
//! | [`app`] | `Session` — ties a composer to a scheduler and handles commands |
//! | [`command`] | Terminal / scripted command input |
//! | [`config`] | TOML configuration |
//! | [`export`] | `.mid` and `.json` output |
//!
//! ## Session commands
//!
//! | Command | Action |
//! |---|---|
//! | `new <prompt>` | Stop playback, discard the old composition, generate a new one |
//! | `play` | Start a pass (no-op while one is running) |
//! | `stop` | Cancel the pass; the sounding note finishes, nothing after it plays |
//! | `export <path>` | Save as Standard MIDI File (`.mid`) or JSON (`.json`) |
//! | `status` | Show what is loaded and which note is sounding |
//! | `quit` | Leave |
//!
//! ## Feature flags
//!
//! * (default) — MIDI backend runs silently; no system MIDI libraries needed.
//! * `midi` — send notes to the first available MIDI output port via `midir`.

pub mod tone;
pub mod scheduler;
pub mod cycle;
pub mod sources;
pub mod export;
pub mod config;
pub mod command;
pub mod app;
