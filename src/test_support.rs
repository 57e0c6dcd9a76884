//! Fixture builders shared by the unit tests.

use midly::num::{u4, u7, u15, u24, u28};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

pub(crate) type Track = Vec<TrackEvent<'static>>;

/// Hand-assembled SMF bytes for tests that need exact control over the layout.
pub(crate) fn raw_smf(format: u16, division: u16, tracks: &[&[u8]]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"MThd");
    bytes.extend_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(&format.to_be_bytes());
    bytes.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    bytes.extend_from_slice(&division.to_be_bytes());
    for track in tracks {
        bytes.extend_from_slice(b"MTrk");
        bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
        bytes.extend_from_slice(track);
    }
    bytes
}

/// Encodes a format 1 file with midly.
pub(crate) fn encode_smf(division: u16, tracks: Vec<Track>) -> Vec<u8> {
    let mut smf = Smf::new(Header::new(Format::Parallel, Timing::Metrical(u15::new(division))));
    smf.tracks = tracks;

    let mut bytes = Vec::new();
    smf.write_std(&mut bytes).unwrap();
    bytes
}

fn event(delta: u32, kind: TrackEventKind<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind,
    }
}

pub(crate) fn note_on(delta: u32, key: u8, velocity: u8) -> TrackEvent<'static> {
    event(
        delta,
        TrackEventKind::Midi {
            channel: u4::new(0),
            message: MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(velocity),
            },
        },
    )
}

pub(crate) fn note_off(delta: u32, key: u8) -> TrackEvent<'static> {
    event(
        delta,
        TrackEventKind::Midi {
            channel: u4::new(0),
            message: MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(0),
            },
        },
    )
}

pub(crate) fn tempo(delta: u32, value: u32) -> TrackEvent<'static> {
    event(delta, TrackEventKind::Meta(MetaMessage::Tempo(u24::new(value))))
}

pub(crate) fn time_signature(delta: u32, numerator: u8, power: u8) -> TrackEvent<'static> {
    event(
        delta,
        TrackEventKind::Meta(MetaMessage::TimeSignature(numerator, power, 24, 8)),
    )
}

pub(crate) fn end_of_track(delta: u32) -> TrackEvent<'static> {
    event(delta, TrackEventKind::Meta(MetaMessage::EndOfTrack))
}

/// A track holding one note on `key` from `start` to `end`.
pub(crate) fn single_note(key: u8, start: u32, end: u32) -> Track {
    vec![
        note_on(start, key, 100),
        note_off(end - start, key),
        end_of_track(0),
    ]
}
