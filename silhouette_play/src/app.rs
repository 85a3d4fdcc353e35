//! Top-level session state machine.
//!
//! `Session` owns the `Composer`, the `PlaybackScheduler` and the current
//! `Composition`.  It applies the cycle rules (a new prompt stops playback
//! and throws the old composition away before anything else happens),
//! processes `SessionCommand`s and follows playback events to keep the
//! highlighted spot up to date.

use std::path::Path;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use rand::Rng;
use silhouette_map::{Coordinate, PlacedNote};
use silhouette_midi::MidiSettings;
use tracing::{info, warn};

use crate::command::{SessionCommand, HELP};
use crate::cycle::{Composer, Composition, CycleError, MelodySource, SilhouetteSource};
use crate::export::{self, ExportError, ExportFormat};
use crate::scheduler::{PassOutcome, PlaybackEvent, PlaybackScheduler, PlaybackStatus};

/// How long the run loop waits for a command before polling playback.
const POLL: Duration = Duration::from_millis(25);

/// The spot lit up for the sounding note.
#[derive(Clone, Debug, PartialEq)]
pub struct Highlight {
    pub index: usize,
    pub at:    Coordinate,
    pub label: String,
}

impl Highlight {
    fn of(index: usize, note: &PlacedNote) -> Self {
        Highlight { index, at: note.coordinate(), label: note.note.value.clone() }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Session
// ════════════════════════════════════════════════════════════════════════════

pub struct Session<S, M, R> {
    composer:    Composer<S, M, R>,
    scheduler:   PlaybackScheduler,
    composition: Option<Composition>,
    midi:        MidiSettings,
    highlight:   Option<Highlight>,
    /// Pass number this session started last; events from others are stale.
    live_pass:   Option<u64>,

    // ── status message ────────────────────────────────────────────────────
    pub status:  String,
}

impl<S, M, R> Session<S, M, R>
where
    S: SilhouetteSource,
    M: MelodySource,
    R: Rng,
{
    pub fn new(composer: Composer<S, M, R>, scheduler: PlaybackScheduler, midi: MidiSettings) -> Self {
        Session {
            composer,
            scheduler,
            composition: None,
            midi,
            highlight:   None,
            live_pass:   None,
            status:      "Ready. Type `new <prompt>` to begin.".to_string(),
        }
    }

    // ── generation ────────────────────────────────────────────────────────

    /// Start a new cycle for `prompt`.
    ///
    /// Playback is stopped and the previous composition discarded first, so
    /// on failure the session is idle with nothing loaded.
    pub fn submit(&mut self, prompt: &str) -> Result<&Composition, CycleError> {
        self.scheduler.load(Vec::new());
        self.composition = None;
        self.highlight = None;
        self.live_pass = None;
        self.scheduler.drain_events();

        match self.composer.run_generation_cycle(prompt) {
            Ok(comp) => {
                self.scheduler.load(comp.placed.clone());
                self.status = format!(
                    "\"{}\": {} notes on {} spots. Type `play`.",
                    comp.prompt, comp.placed.len(), comp.spots.len()
                );
                Ok(&*self.composition.insert(comp))
            }
            Err(e) => {
                warn!("generation cycle failed: {}", e);
                self.status = e.user_message();
                Err(e)
            }
        }
    }

    // ── playback ──────────────────────────────────────────────────────────

    /// Begin a pass.  False if nothing is loaded or a pass is running.
    pub fn play(&mut self) -> bool {
        if self.scheduler.start() {
            self.live_pass = Some(self.scheduler.status().pass);
            self.status = format!("Playing {} notes ♪", self.scheduler.notes().len());
            true
        } else {
            if self.composition.is_none() {
                self.status = "Nothing to play yet.".to_string();
            } else if self.scheduler.notes().is_empty() {
                self.status = "The melody has no notes.".to_string();
            }
            false
        }
    }

    pub fn stop(&mut self) {
        if self.scheduler.is_playing() {
            self.scheduler.stop();
            self.status = "Stopped.".to_string();
        }
        self.highlight = None;
    }

    /// Follow playback: move the highlight and report pass ends.  Events from
    /// superseded passes are dropped.  Returns the events that were applied.
    pub fn tick(&mut self) -> Vec<PlaybackEvent> {
        let Some(live) = self.live_pass else {
            self.scheduler.drain_events();
            return Vec::new();
        };
        let mut applied = Vec::new();

        for event in self.scheduler.drain_events() {
            match &event {
                PlaybackEvent::NoteStarted { pass, index, note } if *pass == live => {
                    if self.scheduler.is_playing() {
                        self.highlight = Some(Highlight::of(*index, note));
                    }
                }
                PlaybackEvent::PassEnded { pass, outcome } if *pass == live => {
                    self.highlight = None;
                    self.status = match outcome {
                        PassOutcome::Completed => "Finished.".to_string(),
                        PassOutcome::Cancelled => "Stopped.".to_string(),
                        PassOutcome::Failed(e) => format!("Playback failed: {e}"),
                    };
                }
                PlaybackEvent::PassStarted { pass, .. } if *pass == live => {}
                _ => continue,
            }
            applied.push(event);
        }
        applied
    }

    // ── export ────────────────────────────────────────────────────────────

    pub fn export(&mut self, path: &Path) -> Result<ExportFormat, ExportError> {
        let comp = self.composition.as_ref().ok_or(ExportError::NothingToExport)?;
        let format = export::export(comp, &self.midi, path)?;
        self.status = format!("Saved {}", path.display());
        Ok(format)
    }

    // ── process one SessionCommand ────────────────────────────────────────

    /// Apply `cmd`.  Returns false when the session should end.
    pub fn handle_command(&mut self, cmd: SessionCommand) -> bool {
        match cmd {
            SessionCommand::Play => { self.play(); }
            SessionCommand::Stop => self.stop(),
            SessionCommand::Prompt(prompt) => {
                self.status = format!("Composing \"{prompt}\"…");
                let _ = self.submit(&prompt);
            }
            SessionCommand::Export(path) => {
                if let Err(e) = self.export(&path) {
                    warn!("export failed: {}", e);
                    self.status = e.to_string();
                }
            }
            SessionCommand::Status => {
                let st = self.playback();
                self.status = match (self.composition.as_ref(), st.current_index) {
                    (None, _)          => "Nothing loaded.".to_string(),
                    (Some(c), Some(i)) => format!("\"{}\": playing note {} of {}", c.prompt, i + 1, c.placed.len()),
                    (Some(c), None)    => format!("\"{}\": idle, {} notes loaded", c.prompt, c.placed.len()),
                };
            }
            SessionCommand::Help => self.status = HELP.to_string(),
            SessionCommand::Quit => {
                self.stop();
                return false;
            }
        }
        true
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn composition(&self) -> Option<&Composition> { self.composition.as_ref() }
    pub fn highlight(&self)   -> Option<&Highlight>   { self.highlight.as_ref() }
    pub fn playback(&self)    -> PlaybackStatus       { self.scheduler.status() }
    pub fn is_playing(&self)  -> bool                 { self.scheduler.is_playing() }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main session loop
// ════════════════════════════════════════════════════════════════════════════

/// Drive `session` from `commands` until `Quit` or the source hangs up,
/// printing status changes and one line per highlighted note.
pub fn run<S, M, R>(session: &mut Session<S, M, R>, commands: Receiver<SessionCommand>)
where
    S: SilhouetteSource,
    M: MelodySource,
    R: Rng,
{
    let mut shown = String::new();
    loop {
        match commands.recv_timeout(POLL) {
            Ok(cmd) => {
                if !session.handle_command(cmd) { break; }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        for event in session.tick() {
            if let PlaybackEvent::NoteStarted { index, note, .. } = event {
                println!("  ♪ {:>3}  {:<4} at {}", index, note.note.value, note.coordinate());
            }
        }

        if session.status != shown {
            println!("  {}", session.status);
            shown = session.status.clone();
        }
    }
    info!("session ended");
}

/// Play the loaded composition once and wait for the pass to end.  Gives
/// up with `Failed` if the playback thread goes away first.
pub fn play_through<S, M, R>(session: &mut Session<S, M, R>) -> Option<PassOutcome>
where
    S: SilhouetteSource,
    M: MelodySource,
    R: Rng,
{
    if !session.play() { return None; }
    loop {
        let alive = session.scheduler.is_alive();
        for event in session.tick() {
            match event {
                PlaybackEvent::NoteStarted { index, note, .. } =>
                    println!("  ♪ {:>3}  {:<4} at {}", index, note.note.value, note.coordinate()),
                PlaybackEvent::PassEnded { outcome, .. } => return Some(outcome),
                PlaybackEvent::PassStarted { .. } => {}
            }
        }
        if !alive {
            warn!("playback thread stopped mid-pass");
            return Some(PassOutcome::Failed("playback thread stopped".into()));
        }
        std::thread::sleep(POLL);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
