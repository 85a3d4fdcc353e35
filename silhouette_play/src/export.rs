//! Saving a composition: Standard MIDI File or JSON.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use silhouette_midi::{MidiSettings, MidiTrack};
use thiserror::Error;
use tracing::info;

use crate::cycle::Composition;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export yet; submit a prompt first")]
    NothingToExport,

    #[error("don't know how to write {0:?}; use .mid or .json")]
    UnknownFormat(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat { Midi, Json }

impl ExportFormat {
    /// Pick a format from the file extension.
    pub fn for_path(path: &Path) -> Result<Self, ExportError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
        match ext.as_str() {
            "mid" | "midi" => Ok(ExportFormat::Midi),
            "json"         => Ok(ExportFormat::Json),
            _              => Err(ExportError::UnknownFormat(path.display().to_string())),
        }
    }
}

/// Write the melody as a Type-0 MIDI file, named after the prompt.
pub fn write_midi(comp: &Composition, settings: &MidiSettings, path: &Path) -> Result<(), ExportError> {
    let track = MidiTrack::from_notes(&comp.melody(), settings, &comp.prompt);
    track.write_file(path)?;
    info!(path = %path.display(), notes = track.notes.len(), "exported MIDI");
    Ok(())
}

/// Write prompt, spots and placed notes as pretty JSON.
pub fn write_json(comp: &Composition, path: &Path) -> Result<(), ExportError> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, comp)?;
    out.write_all(b"\n")?;
    out.flush()?;
    info!(path = %path.display(), notes = comp.placed.len(), "exported JSON");
    Ok(())
}

/// Write in whichever format the extension asks for.
pub fn export(comp: &Composition, settings: &MidiSettings, path: &Path) -> Result<ExportFormat, ExportError> {
    let format = ExportFormat::for_path(path)?;
    match format {
        ExportFormat::Midi => write_midi(comp, settings, path)?,
        ExportFormat::Json => write_json(comp, path)?,
    }
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use silhouette_map::{Coordinate, Note, PlacedNote};

    fn composition() -> Composition {
        let placed = vec![
            PlacedNote::new(Note::new("A4", 440.0, 0.5), "0-aa".into(), Coordinate::new(15, 15)),
            PlacedNote::new(Note::new("C5", 523.25, 0.25), "1-bb".into(), Coordinate::new(30, 15)),
        ];
        Composition {
            prompt: "two notes".into(),
            side:   500,
            raster: RgbaImage::new(1, 1),
            spots:  vec![Coordinate::new(15, 15), Coordinate::new(30, 15)],
            placed,
        }
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ExportFormat::for_path(Path::new("a.mid")).unwrap(), ExportFormat::Midi);
        assert_eq!(ExportFormat::for_path(Path::new("a.MIDI")).unwrap(), ExportFormat::Midi);
        assert_eq!(ExportFormat::for_path(Path::new("a.json")).unwrap(), ExportFormat::Json);
        assert!(matches!(ExportFormat::for_path(Path::new("a.wav")), Err(ExportError::UnknownFormat(_))));
        assert!(ExportFormat::for_path(Path::new("noext")).is_err());
    }

    #[test]
    fn midi_export_writes_smf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mid");
        let fmt = export(&composition(), &MidiSettings::default(), &path).unwrap();
        assert_eq!(fmt, ExportFormat::Midi);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], b"MThd");
        assert!(bytes.windows(9).any(|w| w == b"two notes"));
    }

    #[test]
    fn json_export_round_trips_placements() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.json");
        export(&composition(), &MidiSettings::default(), &path).unwrap();

        let v: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(v["prompt"], "two notes");
        let placed: Vec<PlacedNote> = serde_json::from_value(v["placed"].clone()).unwrap();
        assert_eq!(placed, composition().placed);
    }
}
