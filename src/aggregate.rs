use crate::cursor::EndOfBuffer;
use crate::decoder::{TrackDecoder, TrackEvent};
use crate::error::LoadError;
use crate::model::note::{Tempo, TickInfo};
use std::collections::BTreeMap;

/// Per-tick deltas contributed by one track.
#[derive(Debug, Default)]
pub struct TrackCounts {
    pub ticks: BTreeMap<u32, TickInfo>,
    pub tempos: Vec<Tempo>,
    pub note_count: u64,
    pub track_time: u32,
}

/// Decodes one track into per-tick polyphony and passed-note deltas.
///
/// Every tick that carries an event gets an entry, even when nothing about the
/// counts changes there.
pub fn count_track(data: &[u8], track: usize) -> Result<TrackCounts, LoadError> {
    let truncated = |source: EndOfBuffer| LoadError::TruncatedTrack { track, source };

    let mut decoder = TrackDecoder::new(data, false);
    let mut counts = TrackCounts::default();

    while let Some(event) = decoder.next_event().map_err(truncated)? {
        let tick = decoder.tick();
        let info = counts.ticks.entry(tick).or_default();
        match event {
            TrackEvent::NoteOn { .. } => {
                info.polyphony_delta += 1;
                info.notes_passed_delta += 1;
                counts.note_count += 1;
            }
            TrackEvent::NoteOff { .. } => info.polyphony_delta -= 1,
            TrackEvent::Tempo(value) => counts.tempos.push(Tempo::new(tick, value)),
            _ => {}
        }
    }

    counts.track_time = decoder.tick();
    Ok(counts)
}

/// Adds one track's deltas into the merged map.
pub fn merge_counts(into: &mut BTreeMap<u32, TickInfo>, from: BTreeMap<u32, TickInfo>) {
    for (tick, info) in from {
        into.entry(tick).or_default().absorb(&info);
    }
}
