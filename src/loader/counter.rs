use crate::aggregate::{TrackCounts, count_track, merge_counts};
use crate::error::LoadError;
use crate::loader::{MidiLoader, checked_path};
use crate::model::config::LoaderConfig;
use crate::model::note::{Tempo, TickInfo};
use crate::smf::{SmfHeader, decode_tracks, read_header, scan_tracks, with_pool};
use crate::timeline::{assign_actual_time, assign_tick_times, normalize_tempos};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CountedMidi {
    pub track_count: u16,
    pub division: u16,
    pub midi_time: u32,
    pub note_count: u64,
    pub duration_micros: f64,
    /// Every tick that carries an event in any track, with the summed deltas.
    pub ticks: BTreeMap<u32, TickInfo>,
    pub tempos: Vec<Tempo>,
}

/// Counter state after a tick: sounding notes, notes started so far, and the
/// tick's wall-clock position.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct RunningTotal {
    pub tick: u32,
    pub polyphony: i64,
    pub notes_passed: u64,
    pub actual_time: f64,
}

pub fn count_notes<R>(mut reader: R, config: LoaderConfig) -> Result<CountedMidi, LoadError>
where
    R: Read + Seek + Send,
{
    let header = read_header(&mut reader)?;
    let chunks = scan_tracks(&mut reader, header.track_count)?;

    with_pool(config.threads, move || {
        let tracks = decode_tracks(reader, &chunks, |track, data| count_track(data, track))?;
        Ok(merge_track_counts(header, tracks))
    })
}

fn merge_track_counts(header: SmfHeader, tracks: Vec<TrackCounts>) -> CountedMidi {
    info!("Merging tick counts..!");

    let midi_time = tracks.iter().map(|t| t.track_time).max().unwrap_or(0);
    let mut note_count = 0;
    let mut ticks = BTreeMap::new();
    let mut tempos = Vec::new();

    for track in tracks {
        note_count += track.note_count;
        merge_counts(&mut ticks, track.ticks);
        tempos.extend(track.tempos);
    }

    normalize_tempos(&mut tempos);
    let duration_micros = assign_actual_time(&mut tempos, header.division, midi_time);
    assign_tick_times(&tempos, header.division, &mut ticks);

    CountedMidi {
        track_count: header.track_count,
        division: header.division,
        midi_time,
        note_count,
        duration_micros,
        ticks,
        tempos,
    }
}

/// Counter loader: no note intervals are kept, only per-tick polyphony and
/// passed-note deltas.
#[derive(Debug, Default)]
pub struct NoteCounter {
    path: Option<PathBuf>,
    config: LoaderConfig,
    counted: Option<CountedMidi>,
}

impl NoteCounter {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            path: None,
            config,
            counted: None,
        }
    }

    pub fn preload_from<R>(&mut self, reader: R) -> Result<(), LoadError>
    where
        R: Read + Seek + Send,
    {
        if self.counted.is_some() {
            return Ok(());
        }
        self.counted = Some(count_notes(reader, self.config)?);
        Ok(())
    }

    pub fn data(&self) -> Option<&CountedMidi> {
        self.counted.as_ref()
    }

    pub fn ticks(&self) -> Option<&BTreeMap<u32, TickInfo>> {
        self.counted.as_ref().map(|c| &c.ticks)
    }

    pub fn tempos(&self) -> &[Tempo] {
        self.counted.as_ref().map(|c| c.tempos.as_slice()).unwrap_or(&[])
    }

    /// Walks the tick map in order, accumulating the deltas.
    pub fn running_totals(&self) -> impl Iterator<Item = RunningTotal> + '_ {
        self.counted
            .iter()
            .flat_map(|c| c.ticks.iter())
            .scan((0i64, 0u64), |(polyphony, passed), (&tick, info)| {
                *polyphony += info.polyphony_delta;
                *passed += info.notes_passed_delta;
                Some(RunningTotal {
                    tick,
                    polyphony: *polyphony,
                    notes_passed: *passed,
                    actual_time: info.actual_time,
                })
            })
    }
}

impl MidiLoader for NoteCounter {
    fn name(&self) -> &'static str {
        "Note Counter"
    }

    fn open_file(&mut self, path: &Path) -> Result<(), LoadError> {
        self.path = Some(checked_path(path)?);
        Ok(())
    }

    fn preload(&mut self) -> Result<(), LoadError> {
        if self.counted.is_some() {
            return Ok(());
        }
        let path = self.path.as_ref().ok_or(LoadError::NoFileOpened)?;
        let file = File::open(path)?;

        info!("Counting notes in '{}'..!", path.display());
        self.preload_from(file)
    }

    fn reset(&mut self) {
        self.counted = None;
    }

    fn is_preloaded(&self) -> bool {
        self.counted.is_some()
    }

    fn track_count(&self) -> u16 {
        self.counted.as_ref().map_or(0, |c| c.track_count)
    }

    fn division(&self) -> u16 {
        self.counted.as_ref().map_or(0, |c| c.division)
    }

    fn note_count(&self) -> u64 {
        self.counted.as_ref().map_or(0, |c| c.note_count)
    }

    fn midi_time(&self) -> u32 {
        self.counted.as_ref().map_or(0, |c| c.midi_time)
    }

    fn duration_micros(&self) -> f64 {
        self.counted.as_ref().map_or(0.0, |c| c.duration_micros)
    }
}
