use crate::cursor::EndOfBuffer;
use crate::decoder::{TrackDecoder, TrackEvent};
use crate::error::LoadError;
use crate::model::note::{Note, Tempo, TimeSignature};
use log::debug;
use std::collections::VecDeque;

/// Everything one track contributes to the merged result.
#[derive(Debug, Default)]
pub struct TrackNotes {
    pub notes: Vec<Note>,
    pub tempos: Vec<Tempo>,
    pub time_signatures: Vec<TimeSignature>,
    /// Tick of the track's end-of-track event.
    pub track_time: u32,
}

/// Pairs note-on and note-off events of one track into closed intervals.
///
/// Each key keeps a queue of indices into `notes` for note-ons that are still
/// open. A note-off always closes the oldest open note on its key.
#[derive(Debug)]
pub struct NoteAssembler {
    track: u16,
    notes: Vec<Note>,
    pending: [VecDeque<usize>; 128],
    orphaned_note_offs: usize,
}

impl NoteAssembler {
    pub fn new(track: u16) -> Self {
        Self::with_capacity(track, 0)
    }

    pub fn with_capacity(track: u16, capacity: usize) -> Self {
        Self {
            track,
            notes: Vec::with_capacity(capacity),
            pending: std::array::from_fn(|_| VecDeque::new()),
            orphaned_note_offs: 0,
        }
    }

    pub fn note_on(&mut self, key: u8, velocity: u8, tick: u32) {
        let key = key & 0x7F;
        self.pending[key as usize].push_back(self.notes.len());
        self.notes.push(Note {
            key,
            velocity,
            track: self.track,
            start: tick,
            end: tick,
        });
    }

    /// Closes the oldest open note on `key`. Without one the event is dropped.
    pub fn note_off(&mut self, key: u8, tick: u32) {
        match self.pending[(key & 0x7F) as usize].pop_front() {
            Some(index) => self.notes[index].end = tick,
            None => self.orphaned_note_offs += 1,
        }
    }

    /// Closes every open note at `tick`.
    pub fn close_all(&mut self, tick: u32) {
        for queue in self.pending.iter_mut() {
            for index in queue.drain(..) {
                self.notes[index].end = tick;
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn open_count(&self) -> usize {
        self.pending.iter().map(VecDeque::len).sum()
    }

    pub fn orphaned_note_offs(&self) -> usize {
        self.orphaned_note_offs
    }

    pub fn into_notes(self) -> Vec<Note> {
        self.notes
    }
}

/// Decodes one track and assembles its notes and global events.
pub fn assemble_track(
    data: &[u8],
    track: usize,
    time_signatures: bool,
) -> Result<TrackNotes, LoadError> {
    let truncated = |source: EndOfBuffer| LoadError::TruncatedTrack { track, source };

    let mut decoder = TrackDecoder::new(data, time_signatures);
    let mut assembler = NoteAssembler::with_capacity(track as u16, data.len() / 8);
    let mut tempos = Vec::new();
    let mut signatures = Vec::new();

    while let Some(event) = decoder.next_event().map_err(truncated)? {
        let tick = decoder.tick();
        match event {
            TrackEvent::NoteOn { key, velocity } => assembler.note_on(key, velocity, tick),
            TrackEvent::NoteOff { key } => assembler.note_off(key, tick),
            TrackEvent::Tempo(value) => tempos.push(Tempo::new(tick, value)),
            TrackEvent::TimeSignature {
                numerator,
                denominator,
            } => signatures.push(TimeSignature::new(tick, numerator, denominator)),
            TrackEvent::EndOfTrack => assembler.close_all(tick),
            TrackEvent::Other => {}
        }
    }

    if assembler.orphaned_note_offs() > 0 {
        debug!(
            "Track {} had {} note-off event(s) without an open note..!",
            track,
            assembler.orphaned_note_offs()
        );
    }

    Ok(TrackNotes {
        notes: assembler.into_notes(),
        tempos,
        time_signatures: signatures,
        track_time: decoder.tick(),
    })
}
