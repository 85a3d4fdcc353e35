//! # silhouette_midi
//!
//! Music-side helpers for silhouette songs:
//!
//! * [`Scale`] / [`PitchMap`] / [`DurationMap`] — turn small integers into
//!   MIDI pitches and note lengths.
//! * [`MelodyComposer`] — a prompt-seeded melody generator built on those
//!   maps, used as the local melody source.
//! * [`MidiTrack`] — writes a melody to a Standard MIDI File (Type 0).
//!
//! MIDI bytes are written directly; no MIDI crate is needed.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use silhouette_midi::{MelodyComposer, MidiSettings, MidiTrack, PitchMap};
//!
//! let melody = MelodyComposer::new()
//!     .pitch_map(PitchMap::pentatonic_major(60))
//!     .length(24)
//!     .compose("a heron taking flight");
//!
//! MidiTrack::from_notes(&melody, &MidiSettings::default(), "heron")
//!     .write_file("heron.mid".as_ref())
//!     .unwrap();
//! ```

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use silhouette_map::{prompt_seed, Note};

// ════════════════════════════════════════════════════════════════════════════
// GeneralMidi — programs that suit short, plucked or struck melodies
// ════════════════════════════════════════════════════════════════════════════

/// General MIDI programs, numbered as sent in a Program Change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum GeneralMidi {
    AcousticGrandPiano = 0,
    Celesta            = 8,
    Glockenspiel       = 9,
    MusicBox           = 10,
    Vibraphone         = 11,
    Marimba            = 12,
    PizzicatoStrings   = 45,
    OrchestralHarp     = 46,
    Flute              = 73,
    Kalimba            = 108,
}

const GM_NAMES: [(GeneralMidi, &str); 10] = [
    (GeneralMidi::AcousticGrandPiano, "Acoustic Grand Piano"),
    (GeneralMidi::Celesta,            "Celesta"),
    (GeneralMidi::Glockenspiel,       "Glockenspiel"),
    (GeneralMidi::MusicBox,           "Music Box"),
    (GeneralMidi::Vibraphone,         "Vibraphone"),
    (GeneralMidi::Marimba,            "Marimba"),
    (GeneralMidi::PizzicatoStrings,   "Pizzicato Strings"),
    (GeneralMidi::OrchestralHarp,     "Orchestral Harp"),
    (GeneralMidi::Flute,              "Flute"),
    (GeneralMidi::Kalimba,            "Kalimba"),
];

impl GeneralMidi {
    pub fn program(self) -> u8 { self as u8 }

    pub fn name(self) -> &'static str { GeneralMidi::name_for(self.program()) }

    /// Display name for any program number.
    pub fn name_for(program: u8) -> &'static str {
        GM_NAMES.iter()
            .find(|(gm, _)| gm.program() == program)
            .map_or("GM program", |&(_, name)| name)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Scale — pitch sets for the PitchMap
// ════════════════════════════════════════════════════════════════════════════

/// A pitch collection, as semitone intervals from the root.
#[derive(Clone, Debug)]
pub struct Scale {
    /// Semitone offsets from root, e.g. `[0,2,4,5,7,9,11]` for major.
    pub intervals: Vec<u8>,
    pub name: &'static str,
}

impl Scale {
    pub fn chromatic() -> Self {
        Scale { intervals: (0..12).collect(), name: "Chromatic" }
    }
    /// Major scale (Ionian): W W H W W W H
    pub fn major() -> Self {
        Scale { intervals: vec![0,2,4,5,7,9,11], name: "Major" }
    }
    /// Natural minor (Aeolian): W H W W H W W
    pub fn minor() -> Self {
        Scale { intervals: vec![0,2,3,5,7,8,10], name: "Minor" }
    }
    pub fn pentatonic_major() -> Self {
        Scale { intervals: vec![0,2,4,7,9], name: "Pentatonic Major" }
    }
    pub fn pentatonic_minor() -> Self {
        Scale { intervals: vec![0,3,5,7,10], name: "Pentatonic Minor" }
    }
    pub fn dorian() -> Self {
        Scale { intervals: vec![0,2,3,5,7,9,10], name: "Dorian" }
    }
    pub fn whole_tone() -> Self {
        Scale { intervals: vec![0,2,4,6,8,10], name: "Whole Tone" }
    }
    pub fn custom(intervals: Vec<u8>) -> Self {
        Scale { intervals, name: "Custom" }
    }
    pub fn len(&self) -> usize { self.intervals.len() }
    pub fn is_empty(&self) -> bool { self.intervals.is_empty() }
}

/// Config-friendly scale selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleKind {
    #[default]
    Major,
    Minor,
    PentatonicMajor,
    PentatonicMinor,
    Dorian,
    WholeTone,
    Chromatic,
}

impl ScaleKind {
    pub fn scale(self) -> Scale {
        match self {
            ScaleKind::Major           => Scale::major(),
            ScaleKind::Minor           => Scale::minor(),
            ScaleKind::PentatonicMajor => Scale::pentatonic_major(),
            ScaleKind::PentatonicMinor => Scale::pentatonic_minor(),
            ScaleKind::Dorian          => Scale::dorian(),
            ScaleKind::WholeTone       => Scale::whole_tone(),
            ScaleKind::Chromatic       => Scale::chromatic(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PitchMap — scale degree → MIDI note number (0–127)
// ════════════════════════════════════════════════════════════════════════════

/// Maps a scale degree to a MIDI note number.
///
/// Degrees index into a [`Scale`] (wrapping across octaves), starting from
/// a configurable root note.
///
/// ```rust
/// use silhouette_midi::PitchMap;
///
/// let pm = PitchMap::major(60);
/// assert_eq!(pm.note_for(0), 60);  // C4
/// assert_eq!(pm.note_for(1), 62);  // D4
/// assert_eq!(pm.note_for(7), 72);  // C5 (octave wrap)
/// ```
#[derive(Clone, Debug)]
pub struct PitchMap {
    /// MIDI note number for degree 0.
    pub root:  u8,
    pub scale: Scale,
}

impl PitchMap {
    pub fn major(root: u8) -> Self {
        PitchMap { root, scale: Scale::major() }
    }
    pub fn pentatonic_major(root: u8) -> Self {
        PitchMap { root, scale: Scale::pentatonic_major() }
    }
    pub fn chromatic(root: u8) -> Self {
        PitchMap { root, scale: Scale::chromatic() }
    }
    pub fn custom(root: u8, scale: Scale) -> Self {
        PitchMap { root, scale }
    }

    /// Resolve degree `d` to a MIDI note number, clamped to 0–127.
    pub fn note_for(&self, d: u8) -> u8 {
        let n = self.scale.len();
        if n == 0 { return self.root.min(127); }
        let octave   = (d as usize) / n;
        let degree   = (d as usize) % n;
        let semitone = self.scale.intervals[degree] as usize;
        let note     = self.root as usize + octave * 12 + semitone;
        note.min(127) as u8
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DurationMap — small integer → MIDI ticks
// ════════════════════════════════════════════════════════════════════════════

/// Maps an index to a note duration in MIDI ticks.
#[derive(Clone, Debug)]
pub struct DurationMap {
    /// Ticks per entry.
    pub table: Vec<u32>,
    pub name:  &'static str,
}

impl DurationMap {
    /// Musical note values at `ticks_per_quarter` resolution: 32nd, 16th,
    /// dotted-16th, 8th, dotted-8th, quarter, dotted-quarter, half,
    /// dotted-half, whole.
    pub fn musical(ticks_per_quarter: u32) -> Self {
        let q = ticks_per_quarter;
        let table = vec![
            q / 8,          // 32nd note
            q / 4,          // 16th note
            q * 3 / 8,      // dotted 16th
            q / 2,          // 8th note
            q * 3 / 4,      // dotted 8th
            q,              // quarter note
            q * 3 / 2,      // dotted quarter
            q * 2,          // half note
            q * 3,          // dotted half
            q * 4,          // whole note
        ];
        DurationMap { table, name: "Musical" }
    }

    /// Ticks for index `d`; wraps if `d >= table.len()`.
    pub fn ticks_for(&self, d: u8) -> u32 {
        if self.table.is_empty() { return 120; }
        self.table[(d as usize) % self.table.len()]
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Pitch and time conversions
// ════════════════════════════════════════════════════════════════════════════

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Equal-tempered frequency of a MIDI note (A4 = 69 = 440 Hz).
pub fn midi_to_frequency(pitch: u8) -> f64 {
    440.0 * 2f64.powf((pitch as f64 - 69.0) / 12.0)
}

/// Nearest MIDI note for a frequency.  Non-positive input maps to 0.
pub fn frequency_to_midi(frequency: f64) -> u8 {
    if !frequency.is_finite() || frequency <= 0.0 { return 0; }
    (69.0 + 12.0 * (frequency / 440.0).log2()).round().clamp(0.0, 127.0) as u8
}

/// Scientific pitch name, e.g. `60 → "C4"`.
pub fn note_name(pitch: u8) -> String {
    let octave = pitch as i32 / 12 - 1;
    format!("{}{}", NOTE_NAMES[(pitch % 12) as usize], octave)
}

pub fn ticks_to_seconds(ticks: u32, ticks_per_quarter: u16, tempo_bpm: u32) -> f64 {
    ticks as f64 / ticks_per_quarter.max(1) as f64 * 60.0 / tempo_bpm.max(1) as f64
}

/// Seconds → ticks, never less than one tick.
pub fn seconds_to_ticks(seconds: f64, ticks_per_quarter: u16, tempo_bpm: u32) -> u32 {
    let ticks = seconds * tempo_bpm.max(1) as f64 / 60.0 * ticks_per_quarter.max(1) as f64;
    if !ticks.is_finite() { return 1; }
    (ticks.round() as u32).max(1)
}

// ════════════════════════════════════════════════════════════════════════════
// MelodyComposer — prompt-seeded melody builder
// ════════════════════════════════════════════════════════════════════════════

/// Rhythm pool, as [`DurationMap::musical`] indices: 8th, quarter ×3, half.
const RHYTHM: [u8; 5] = [3, 5, 5, 5, 7];

/// Builds a melody from a text prompt.
///
/// The prompt seeds a random walk over two octaves of the pitch map, so the
/// same prompt always gives the same tune.
#[derive(Clone, Debug)]
pub struct MelodyComposer {
    pitch_map:    PitchMap,
    duration_map: DurationMap,
    tempo_bpm:    u32,
    tpq:          u16,
    length:       usize,
}

impl Default for MelodyComposer {
    fn default() -> Self { MelodyComposer::new() }
}

impl MelodyComposer {
    /// Defaults: C major from middle C, musical durations, 120 BPM,
    /// 480 ticks/quarter, 16 notes.
    pub fn new() -> Self {
        MelodyComposer {
            pitch_map:    PitchMap::major(60),
            duration_map: DurationMap::musical(480),
            tempo_bpm:    120,
            tpq:          480,
            length:       16,
        }
    }

    // ── setters (builder pattern) ─────────────────────────────────────────

    pub fn pitch_map(mut self, pm: PitchMap) -> Self {
        self.pitch_map = pm;
        self
    }

    /// Tempo in BPM, clamped to 20–300.
    pub fn tempo(mut self, bpm: u32) -> Self {
        self.tempo_bpm = bpm.clamp(20, 300);
        self
    }

    /// Resolution the duration map was built for.
    /// Resolution; the rhythm table is rebuilt to match.
    pub fn ticks_per_quarter(mut self, tpq: u16) -> Self {
        self.tpq = tpq.max(1);
        self.duration_map = DurationMap::musical(self.tpq as u32);
        self
    }

    /// Number of notes per melody.
    pub fn length(mut self, n: usize) -> Self {
        self.length = n;
        self
    }

    // ── composition ───────────────────────────────────────────────────────

    pub fn compose(&self, prompt: &str) -> Vec<Note> {
        let mut rng = Pcg64::seed_from_u64(prompt_seed(prompt));
        let span = (self.pitch_map.scale.len() * 2).clamp(1, u8::MAX as usize) as i32;
        let mut degree = span / 2;

        (0..self.length).map(|_| {
            degree = (degree + rng.random_range(-2..=2)).clamp(0, span - 1);
            let pitch = self.pitch_map.note_for(degree as u8);
            let digit = RHYTHM[rng.random_range(0..RHYTHM.len())];
            let ticks = self.duration_map.ticks_for(digit);
            Note::new(
                note_name(pitch),
                midi_to_frequency(pitch),
                ticks_to_seconds(ticks, self.tpq, self.tempo_bpm),
            )
        }).collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MidiTrack — resolved note sequence before serialisation
// ════════════════════════════════════════════════════════════════════════════

/// Output parameters shared by MIDI export and live MIDI playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MidiSettings {
    pub tempo_bpm:         u32,
    pub ticks_per_quarter: u16,
    pub instrument:        u8,
    pub channel:           u8,
    pub velocity:          u8,
}

impl Default for MidiSettings {
    fn default() -> Self {
        MidiSettings {
            tempo_bpm:         120,
            ticks_per_quarter: 480,
            instrument:        GeneralMidi::Vibraphone.program(),
            channel:           0,
            velocity:          100,
        }
    }
}

/// One note as it will be written: pitch, ticks, velocity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackNote {
    pub pitch:    u8,
    pub duration: u32,
    pub velocity: u8,
}

/// A resolved note sequence ready for MIDI serialisation.
pub struct MidiTrack {
    pub notes:             Vec<TrackNote>,
    pub ticks_per_quarter: u16,
    pub tempo_bpm:         u32,
    pub instrument:        u8,
    pub channel:           u8,
    /// Embedded as the track name.
    pub description:       String,
}

impl MidiTrack {
    /// Resolve a melody: frequency → nearest MIDI pitch, seconds → ticks.
    pub fn from_notes(notes: &[Note], settings: &MidiSettings, description: &str) -> Self {
        let notes = notes.iter().map(|n| TrackNote {
            pitch:    frequency_to_midi(n.frequency),
            duration: seconds_to_ticks(n.duration, settings.ticks_per_quarter, settings.tempo_bpm),
            velocity: settings.velocity.min(127),
        }).collect();

        MidiTrack {
            notes,
            ticks_per_quarter: settings.ticks_per_quarter.max(1),
            tempo_bpm:         settings.tempo_bpm.max(1),
            instrument:        settings.instrument.min(127),
            channel:           settings.channel & 0x0F,
            description:       description.to_string(),
        }
    }

    /// Write the Type-0 file to `path`.
    pub fn write_file(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_bytes())?;
        tracing::debug!(path = %path.display(), notes = self.notes.len(), "wrote MIDI file");
        Ok(())
    }

    /// The complete file: one `MThd` header followed by one `MTrk` chunk.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut header = Vec::with_capacity(6);
        header.extend_from_slice(&0u16.to_be_bytes()); // format 0
        header.extend_from_slice(&1u16.to_be_bytes()); // one track
        header.extend_from_slice(&self.ticks_per_quarter.to_be_bytes());

        let mut out = Vec::new();
        push_chunk(&mut out, b"MThd", &header);
        push_chunk(&mut out, b"MTrk", &self.track_events());
        out
    }

    /// Track body.  Every event except the note-offs sits at delta 0; each
    /// note-off is delayed by its note's length, so notes follow one another
    /// without gaps.
    fn track_events(&self) -> Vec<u8> {
        let ch = self.channel & 0x0F;
        let mut ev = Vec::new();

        let tempo = 60_000_000u32 / self.tempo_bpm.max(1);
        meta_event(&mut ev, 0x51, &tempo.to_be_bytes()[1..]);
        meta_event(&mut ev, 0x03, self.description.as_bytes());
        ev.extend_from_slice(&[0x00, 0xC0 | ch, self.instrument]);

        for n in &self.notes {
            ev.extend_from_slice(&[0x00, 0x90 | ch, n.pitch, n.velocity]);
            write_vlq(&mut ev, n.duration);
            ev.extend_from_slice(&[0x80 | ch, n.pitch, 0x00]);
        }

        meta_event(&mut ev, 0x2F, &[]);
        ev
    }
}

fn push_chunk(out: &mut Vec<u8>, tag: &[u8; 4], body: &[u8]) {
    out.extend_from_slice(tag);
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(body);
}

/// Meta event at delta 0: `00 FF <kind> <len> <data>`.
fn meta_event(ev: &mut Vec<u8>, kind: u8, data: &[u8]) {
    ev.extend_from_slice(&[0x00, 0xFF, kind]);
    write_vlq(ev, data.len() as u32);
    ev.extend_from_slice(data);
}

/// MIDI variable-length quantity: 7 bits per byte, most significant first,
/// high bit set on all but the last.
fn write_vlq(buf: &mut Vec<u8>, value: u32) {
    let mut groups = vec![(value & 0x7F) as u8];
    let mut rest = value >> 7;
    while rest > 0 {
        groups.push((rest & 0x7F) as u8 | 0x80);
        rest >>= 7;
    }
    buf.extend(groups.iter().rev());
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    // ── VLQ encoding ─────────────────────────────────────────────────────
    #[test]
    fn vlq_single_byte() {
        let mut b = Vec::new();
        write_vlq(&mut b, 0x40);
        assert_eq!(b, [0x40]);
    }

    #[test]
    fn vlq_two_bytes() {
        let mut b = Vec::new();
        write_vlq(&mut b, 128);
        assert_eq!(b, [0x81, 0x00]);
    }

    #[test]
    fn vlq_zero() {
        let mut b = Vec::new();
        write_vlq(&mut b, 0);
        assert_eq!(b, [0x00]);
    }

    #[test]
    fn vlq_large_value() {
        let mut b = Vec::new();
        write_vlq(&mut b, 0x0FFF_FFFF);
        assert_eq!(b, [0xFF, 0xFF, 0xFF, 0x7F]);
    }

    // ── PitchMap ─────────────────────────────────────────────────────────
    #[test]
    fn pitch_map_major() {
        let pm = PitchMap::major(60);
        assert_eq!(pm.note_for(0), 60);
        assert_eq!(pm.note_for(2), 64);
        assert_eq!(pm.note_for(6), 71);
        assert_eq!(pm.note_for(7), 72); // octave wrap
    }

    #[test]
    fn pitch_map_clamp_at_127() {
        assert_eq!(PitchMap::chromatic(120).note_for(9), 127);
    }

    #[test]
    fn pitch_map_empty_scale_is_root() {
        assert_eq!(PitchMap::custom(64, Scale::custom(vec![])).note_for(5), 64);
    }

    // ── DurationMap ───────────────────────────────────────────────────────
    #[test]
    fn duration_map_musical_quarter() {
        assert_eq!(DurationMap::musical(480).ticks_for(5), 480);
    }

    #[test]
    fn duration_map_wraps() {
        let dm = DurationMap { table: vec![100, 200, 300], name: "t" };
        assert_eq!(dm.ticks_for(3), 100);
        assert_eq!(dm.ticks_for(4), 200);
    }

    // ── conversions ──────────────────────────────────────────────────────
    #[test]
    fn a4_is_440() {
        assert!((midi_to_frequency(69) - 440.0).abs() < 1e-9);
        assert_eq!(frequency_to_midi(440.0), 69);
        assert_eq!(frequency_to_midi(261.63), 60);
    }

    #[test]
    fn bad_frequencies_map_to_zero() {
        assert_eq!(frequency_to_midi(0.0), 0);
        assert_eq!(frequency_to_midi(-10.0), 0);
        assert_eq!(frequency_to_midi(f64::NAN), 0);
    }

    #[test]
    fn note_names() {
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(69), "A4");
        assert_eq!(note_name(61), "C#4");
        assert_eq!(note_name(0), "C-1");
    }

    #[test]
    fn quarter_at_120_is_half_second() {
        assert!((ticks_to_seconds(480, 480, 120) - 0.5).abs() < 1e-9);
        assert_eq!(seconds_to_ticks(0.5, 480, 120), 480);
        assert_eq!(seconds_to_ticks(0.0, 480, 120), 1);
    }

    // ── GeneralMidi ───────────────────────────────────────────────────────
    #[test]
    fn gm_program_numbers() {
        assert_eq!(GeneralMidi::AcousticGrandPiano.program(), 0);
        assert_eq!(GeneralMidi::Vibraphone.program(), 11);
        assert_eq!(GeneralMidi::Kalimba.program(), 108);
        assert_eq!(GeneralMidi::Marimba.name(), "Marimba");
        assert_eq!(GeneralMidi::name_for(11), "Vibraphone");
        assert_eq!(GeneralMidi::name_for(127), "GM program");
    }

    // ── MelodyComposer ────────────────────────────────────────────────────
    #[test]
    fn compose_length() {
        assert_eq!(MelodyComposer::new().length(9).compose("fox").len(), 9);
        assert!(MelodyComposer::new().length(0).compose("fox").is_empty());
    }

    #[test]
    fn compose_is_deterministic_per_prompt() {
        let c = MelodyComposer::new();
        assert_eq!(c.compose("a lighthouse"), c.compose("a lighthouse"));
        assert_ne!(c.compose("a lighthouse"), c.compose("a windmill"));
    }

    #[test]
    fn compose_stays_in_scale() {
        let pm = PitchMap::pentatonic_major(60);
        let allowed: Vec<u8> = (0..10).map(|d| pm.note_for(d)).collect();
        let melody = MelodyComposer::new().pitch_map(pm).length(64).compose("owl");
        for n in &melody {
            assert!(allowed.contains(&frequency_to_midi(n.frequency)), "{}", n.value);
            assert!(n.duration > 0.0);
        }
    }

    #[test]
    fn compose_durations_ignore_resolution() {
        let coarse = MelodyComposer::new().ticks_per_quarter(96).compose("heron");
        let fine = MelodyComposer::new().ticks_per_quarter(960).compose("heron");
        for (a, b) in coarse.iter().zip(&fine) {
            assert!((a.duration - b.duration).abs() < 1e-9, "{} vs {}", a.duration, b.duration);
        }
    }

    #[test]
    fn compose_labels_match_pitch() {
        for n in MelodyComposer::new().compose("moth") {
            assert_eq!(n.value, note_name(frequency_to_midi(n.frequency)));
        }
    }

    // ── MIDI file structure ───────────────────────────────────────────────
    fn sample_track() -> MidiTrack {
        let notes = vec![Note::new("A4", 440.0, 0.5), Note::new("C4", 261.63, 1.0)];
        MidiTrack::from_notes(&notes, &MidiSettings::default(), "test")
    }

    #[test]
    fn from_notes_resolves_pitch_and_ticks() {
        let t = sample_track();
        assert_eq!(t.notes[0], TrackNote { pitch: 69, duration: 480, velocity: 100 });
        assert_eq!(t.notes[1].pitch, 60);
        assert_eq!(t.notes[1].duration, 960);
        assert_eq!(t.instrument, 11);
    }

    #[test]
    fn midi_bytes_header() {
        let bytes = sample_track().to_bytes();
        assert_eq!(&bytes[0..4], b"MThd");
        assert_eq!(&bytes[8..12], &[0, 0, 0, 1]); // format 0, 1 track
        assert_eq!(&bytes[14..18], b"MTrk");
        // 120 BPM = 500 000 µs per quarter
        assert_eq!(&bytes[22..29], &[0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]);
        let n = bytes.len();
        assert_eq!(&bytes[n - 3..], &[0xFF, 0x2F, 0x00]);
        let track_len = u32::from_be_bytes([bytes[18], bytes[19], bytes[20], bytes[21]]) as usize;
        assert_eq!(track_len, n - 22);
    }

    #[test]
    fn write_file_roundtrips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mid");
        let track = sample_track();
        track.write_file(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), track.to_bytes());
    }
}
