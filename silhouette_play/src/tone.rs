//! Tone primitives: the blocking "sound one note" step the scheduler drives.
//!
//! [`TonePlayer::play_tone`] must not return until the note has finished
//! (or failed).  Two backends ship here:
//!
//! * [`MidiTone`] — note-on, wait, note-off on a MIDI output port
//!   (needs the `midi` feature; otherwise it runs silently).
//! * [`SilentTone`] — just waits out each note's duration.

use std::thread;
use std::time::Duration;

use silhouette_map::Note;
use silhouette_midi::{frequency_to_midi, MidiSettings};
use thiserror::Error;
use tracing::{debug, info, warn};

// ════════════════════════════════════════════════════════════════════════════
// TonePlayer — the external primitive
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum ToneError {
    #[error("MIDI send failed: {0}")]
    Midi(String),

    #[error("note {label} has unplayable duration {duration}s")]
    BadDuration { label: String, duration: f64 },

    #[error("{0}")]
    Backend(String),
}

/// Anything that can sound a single note and block until it is done.
pub trait TonePlayer: Send + 'static {
    fn play_tone(&mut self, note: &Note) -> Result<(), ToneError>;
}

impl<T: TonePlayer + ?Sized> TonePlayer for Box<T> {
    fn play_tone(&mut self, note: &Note) -> Result<(), ToneError> {
        (**self).play_tone(note)
    }
}

/// Wall-clock length of a note.  Negative or non-finite durations fail.
pub fn note_length(note: &Note) -> Result<Duration, ToneError> {
    Duration::try_from_secs_f64(note.duration).map_err(|_| ToneError::BadDuration {
        label:    note.value.clone(),
        duration: note.duration,
    })
}

// ════════════════════════════════════════════════════════════════════════════
// MidiOut — abstraction over midir / null (for testing)
// ════════════════════════════════════════════════════════════════════════════

trait MidiOut: Send {
    fn send(&mut self, message: &[u8]) -> Result<(), ToneError>;
}

// ── midir backend ─────────────────────────────────────────────────────────

#[cfg(feature = "midi")]
struct MidirOut {
    conn: midir::MidiOutputConnection,
}

#[cfg(feature = "midi")]
impl MidiOut for MidirOut {
    fn send(&mut self, message: &[u8]) -> Result<(), ToneError> {
        self.conn.send(message).map_err(|e| ToneError::Midi(e.to_string()))
    }
}

// ── null backend (used when no MIDI port is available) ────────────────────

struct NullOut;

impl MidiOut for NullOut {
    fn send(&mut self, _message: &[u8]) -> Result<(), ToneError> { Ok(()) }
}

// ════════════════════════════════════════════════════════════════════════════
// open_midi_output — enumerate ports and pick first available
// ════════════════════════════════════════════════════════════════════════════

/// Try to open a MIDI output port, preferring a software synth.
/// Falls back to `NullOut` with a warning if none is found.
#[cfg(feature = "midi")]
fn open_midi_output() -> (Box<dyn MidiOut>, bool) {
    let midi_out = match midir::MidiOutput::new("silhouette_song") {
        Ok(m)  => m,
        Err(e) => {
            warn!("MIDI init error: {} — playing silently", e);
            return (Box::new(NullOut), false);
        }
    };

    let ports = midi_out.ports();
    if ports.is_empty() {
        warn!("no MIDI output ports found — playing silently");
        warn!("start a synthesiser such as `fluidsynth` or `timidity -iA` to hear notes");
        return (Box::new(NullOut), false);
    }

    let port_idx = ports.iter().enumerate()
        .find(|(_, p)| {
            midi_out.port_name(p).map(|n| {
                let n = n.to_lowercase();
                n.contains("fluid") || n.contains("timidity") ||
                n.contains("microsoft") || n.contains("synth")
            }).unwrap_or(false)
        })
        .map(|(i, _)| i)
        .unwrap_or(0);

    let port = &ports[port_idx];
    let name = midi_out.port_name(port).unwrap_or_else(|_| "Unknown".to_string());
    info!("opening MIDI port: {}", name);

    match midi_out.connect(port, "silhouette-play") {
        Ok(conn) => (Box::new(MidirOut { conn }), true),
        Err(e) => {
            warn!("failed to connect to {}: {} — playing silently", name, e);
            (Box::new(NullOut), false)
        }
    }
}

#[cfg(not(feature = "midi"))]
fn open_midi_output() -> (Box<dyn MidiOut>, bool) {
    info!("built without the `midi` feature — playing silently");
    (Box::new(NullOut), false)
}

// ════════════════════════════════════════════════════════════════════════════
// MidiTone
// ════════════════════════════════════════════════════════════════════════════

/// Plays each note as note-on / wait / note-off on one MIDI channel.
pub struct MidiTone {
    out:       Box<dyn MidiOut>,
    settings:  MidiSettings,
    connected: bool,
}

impl MidiTone {
    /// Open the best available port and select the configured instrument.
    pub fn open(settings: MidiSettings) -> Self {
        let (out, connected) = open_midi_output();
        Self::with_output(out, settings, connected)
    }

    fn with_output(out: Box<dyn MidiOut>, settings: MidiSettings, connected: bool) -> Self {
        let mut tone = MidiTone { out, settings, connected };
        let ch = tone.settings.channel & 0x0F;
        if let Err(e) = tone.out.send(&[0xC0 | ch, tone.settings.instrument & 0x7F]) {
            warn!("program change failed: {}", e);
        }
        tone
    }

    /// False when playing through the null backend.
    pub fn is_connected(&self) -> bool { self.connected }
}

impl TonePlayer for MidiTone {
    fn play_tone(&mut self, note: &Note) -> Result<(), ToneError> {
        let length = note_length(note)?;
        let pitch  = frequency_to_midi(note.frequency);
        let ch     = self.settings.channel & 0x0F;

        debug!(label = %note.value, pitch, ?length, "note on");
        self.out.send(&[0x90 | ch, pitch, self.settings.velocity & 0x7F])?;
        thread::sleep(length);
        self.out.send(&[0x80 | ch, pitch, 0])
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SilentTone
// ════════════════════════════════════════════════════════════════════════════

/// Keeps time without making a sound.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentTone;

impl TonePlayer for SilentTone {
    fn play_tone(&mut self, note: &Note) -> Result<(), ToneError> {
        let length = note_length(note)?;
        debug!(label = %note.value, ?length, "silent note");
        thread::sleep(length);
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingOut {
        sent: Arc<Mutex<Vec<Vec<u8>>>>,
        fail: bool,
    }

    impl MidiOut for RecordingOut {
        fn send(&mut self, message: &[u8]) -> Result<(), ToneError> {
            if self.fail { return Err(ToneError::Midi("port closed".into())); }
            self.sent.lock().unwrap().push(message.to_vec());
            Ok(())
        }
    }

    fn settings() -> MidiSettings {
        MidiSettings { channel: 2, instrument: 11, velocity: 90, ..MidiSettings::default() }
    }

    #[test]
    fn note_on_then_off() {
        let out = RecordingOut::default();
        let mut tone = MidiTone::with_output(Box::new(out.clone()), settings(), true);
        tone.play_tone(&Note::new("A4", 440.0, 0.0)).unwrap();
        assert_eq!(*out.sent.lock().unwrap(), vec![
            vec![0xC2, 11],
            vec![0x92, 69, 90],
            vec![0x82, 69, 0],
        ]);
    }

    #[test]
    fn bad_duration_sends_nothing() {
        let out = RecordingOut::default();
        let mut tone = MidiTone::with_output(Box::new(out.clone()), settings(), true);
        let err = tone.play_tone(&Note::new("A4", 440.0, -1.0)).unwrap_err();
        assert!(matches!(err, ToneError::BadDuration { .. }));
        assert_eq!(out.sent.lock().unwrap().len(), 1); // program change only
    }

    #[test]
    fn send_failure_reported() {
        let out = RecordingOut { fail: true, ..RecordingOut::default() };
        let mut tone = MidiTone::with_output(Box::new(out), settings(), true);
        let err = tone.play_tone(&Note::new("A4", 440.0, 0.0)).unwrap_err();
        assert!(matches!(err, ToneError::Midi(_)));
    }

    #[cfg(not(feature = "midi"))]
    #[test]
    fn without_midi_feature_tone_is_unconnected() {
        let mut tone = MidiTone::open(settings());
        assert!(!tone.is_connected());
        assert!(tone.play_tone(&Note::new("A4", 440.0, 0.0)).is_ok());
    }

    #[test]
    fn note_length_checks() {
        assert_eq!(note_length(&Note::new("x", 1.0, 0.25)).unwrap(), Duration::from_millis(250));
        assert!(note_length(&Note::new("x", 1.0, f64::NAN)).is_err());
        assert!(note_length(&Note::new("x", 1.0, f64::INFINITY)).is_err());
    }

    #[test]
    fn silent_tone_waits() {
        let start = std::time::Instant::now();
        SilentTone.play_tone(&Note::new("x", 1.0, 0.02)).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn boxed_player_delegates() {
        let mut boxed: Box<dyn TonePlayer> = Box::new(SilentTone);
        assert!(boxed.play_tone(&Note::new("x", 1.0, 0.0)).is_ok());
    }
}
