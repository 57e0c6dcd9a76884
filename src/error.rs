use crate::cursor::EndOfBuffer;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("MIDI file does not exist: {0}")]
    FileNotFound(PathBuf),

    #[error("no MIDI file has been opened")]
    NoFileOpened,

    #[error("failed to read MIDI data: {0}")]
    Io(#[from] std::io::Error),

    #[error("MIDI file corrupted: expected \"MThd\" at the start of the file")]
    BadHeaderMagic,

    #[error("MIDI file corrupted: header length should be 6, found {0}")]
    BadHeaderLength(u32),

    #[error("MIDI format {0} is not supported")]
    UnsupportedFormat(u16),

    #[error("division {0:#06x} is not supported, expected 1..=32767 ticks per quarter note")]
    UnsupportedDivision(u16),

    #[error("MIDI file corrupted: expected \"MTrk\" at the head of track {track}")]
    BadTrackMagic { track: usize },

    #[error("track {track} ended without an end-of-track event")]
    TruncatedTrack {
        track: usize,
        #[source]
        source: EndOfBuffer,
    },

    #[error("MIDI source lock was poisoned by a panicking worker")]
    SourcePoisoned,

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
