use crate::assembler::{TrackNotes, assemble_track};
use crate::error::LoadError;
use crate::loader::{MidiLoader, checked_path};
use crate::model::config::LoaderConfig;
use crate::model::note::{Note, Tempo, TimeSignature};
use crate::overlap::resolve_overlaps;
use crate::smf::{SmfHeader, decode_tracks, read_header, scan_tracks, with_pool};
use crate::sort::introsort;
use crate::timeline::{assign_actual_time, normalize_tempos, normalize_time_signatures, tick_to_micros};
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

/// Fully preloaded note data. Read-only once built.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoadedMidi {
    pub format: u16,
    pub track_count: u16,
    pub division: u16,
    /// Latest end-of-track tick over all tracks.
    pub midi_time: u32,
    pub note_count: u64,
    pub duration_micros: f64,
    /// One buffer per key, each sorted by start tick then track.
    pub notes: Vec<Vec<Note>>,
    pub tempos: Vec<Tempo>,
    /// Empty when time signatures were not decoded.
    pub time_signatures: Vec<TimeSignature>,
}

impl LoadedMidi {
    pub fn notes_for(&self, key: u8) -> &[Note] {
        self.notes.get(key as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn tick_to_micros(&self, tick: u32) -> f64 {
        tick_to_micros(&self.tempos, self.division, tick)
    }
}

/// Decodes a whole SMF from `reader` into per-key note buffers.
pub fn load_notes<R>(mut reader: R, config: LoaderConfig) -> Result<LoadedMidi, LoadError>
where
    R: Read + Seek + Send,
{
    let header = read_header(&mut reader)?;
    let chunks = scan_tracks(&mut reader, header.track_count)?;

    with_pool(config.threads, move || {
        let tracks = decode_tracks(reader, &chunks, |track, data| {
            assemble_track(data, track, config.time_signatures)
        })?;
        Ok(merge_tracks(header, tracks, config))
    })
}

fn merge_tracks(header: SmfHeader, tracks: Vec<TrackNotes>, config: LoaderConfig) -> LoadedMidi {
    info!("Merging events..!");

    let midi_time = tracks.iter().map(|t| t.track_time).max().unwrap_or(0);
    let note_count = tracks.iter().map(|t| t.notes.len() as u64).sum();

    let mut per_key = [0usize; 128];
    for note in tracks.iter().flat_map(|t| t.notes.iter()) {
        per_key[note.key as usize] += 1;
    }

    let mut notes: Vec<Vec<Note>> = per_key.iter().map(|&len| Vec::with_capacity(len)).collect();
    let mut tempos = Vec::new();
    let mut time_signatures = Vec::new();

    // Tracks arrive in file order, so equal starts are already grouped by track.
    for track in tracks {
        for note in track.notes {
            notes[note.key as usize].push(note);
        }
        tempos.extend(track.tempos);
        time_signatures.extend(track.time_signatures);
    }

    debug!("Sorting {} notes over 128 keys..!", note_count);
    notes
        .par_iter_mut()
        .for_each(|buffer| introsort(buffer, Note::draws_before));

    normalize_tempos(&mut tempos);
    if config.time_signatures {
        normalize_time_signatures(&mut time_signatures);
    }

    if config.resolve_overlaps {
        info!("Removing overlaps..!");
        resolve_overlaps(&mut notes);
    }

    let duration_micros = assign_actual_time(&mut tempos, header.division, midi_time);

    LoadedMidi {
        format: header.format,
        track_count: header.track_count,
        division: header.division,
        midi_time,
        note_count,
        duration_micros,
        notes,
        tempos,
        time_signatures,
    }
}

/// Note loader: one sorted note list per key plus tempo and time-signature
/// timelines.
#[derive(Debug, Default)]
pub struct MidiFile {
    path: Option<PathBuf>,
    config: LoaderConfig,
    loaded: Option<LoadedMidi>,
}

impl MidiFile {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            path: None,
            config,
            loaded: None,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Preloads from an arbitrary source instead of the opened path.
    pub fn preload_from<R>(&mut self, reader: R) -> Result<(), LoadError>
    where
        R: Read + Seek + Send,
    {
        if self.loaded.is_some() {
            return Ok(());
        }
        self.loaded = Some(load_notes(reader, self.config)?);
        Ok(())
    }

    pub fn data(&self) -> Option<&LoadedMidi> {
        self.loaded.as_ref()
    }

    /// Notes on `key` in draw order. Empty before preloading.
    pub fn notes(&self, key: u8) -> &[Note] {
        self.loaded.as_ref().map(|m| m.notes_for(key)).unwrap_or(&[])
    }

    pub fn tempos(&self) -> &[Tempo] {
        self.loaded.as_ref().map(|m| m.tempos.as_slice()).unwrap_or(&[])
    }

    pub fn time_signatures(&self) -> &[TimeSignature] {
        self.loaded
            .as_ref()
            .map(|m| m.time_signatures.as_slice())
            .unwrap_or(&[])
    }
}

impl MidiLoader for MidiFile {
    fn name(&self) -> &'static str {
        "Note Loader"
    }

    fn open_file(&mut self, path: &Path) -> Result<(), LoadError> {
        self.path = Some(checked_path(path)?);
        Ok(())
    }

    fn preload(&mut self) -> Result<(), LoadError> {
        if self.loaded.is_some() {
            return Ok(());
        }
        let path = self.path.as_ref().ok_or(LoadError::NoFileOpened)?;
        let file = File::open(path)?;

        info!("Preloading '{}'..!", path.display());
        self.preload_from(file)
    }

    fn reset(&mut self) {
        self.loaded = None;
    }

    fn is_preloaded(&self) -> bool {
        self.loaded.is_some()
    }

    fn track_count(&self) -> u16 {
        self.loaded.as_ref().map_or(0, |m| m.track_count)
    }

    fn division(&self) -> u16 {
        self.loaded.as_ref().map_or(0, |m| m.division)
    }

    fn note_count(&self) -> u64 {
        self.loaded.as_ref().map_or(0, |m| m.note_count)
    }

    fn midi_time(&self) -> u32 {
        self.loaded.as_ref().map_or(0, |m| m.midi_time)
    }

    fn duration_micros(&self) -> f64 {
        self.loaded.as_ref().map_or(0.0, |m| m.duration_micros)
    }
}
