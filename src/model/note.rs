use serde::{Deserialize, Serialize};

/// Default tempo in microseconds per quarter note (120 BPM).
pub const DEFAULT_TEMPO: u32 = 500_000;
pub const MICROSECONDS_PER_MINUTE: f64 = 60_000_000.0;

/// A closed note interval on one key of one track, in ticks.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Note {
    pub key: u8,
    pub velocity: u8,
    pub track: u16,
    pub start: u32,
    pub end: u32,
}

impl Note {
    #[inline]
    pub fn duration(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Draw order: earlier start first, lower track first on equal starts.
    #[inline]
    pub fn draws_before(left: &Note, right: &Note) -> bool {
        left.start < right.start || (left.track < right.track && left.start == right.start)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    pub tick: u32,
    /// Microseconds per quarter note.
    pub value: u32,
    /// Wall-clock position of `tick`, filled in by the timeline builder.
    pub actual_time: f64,
}

impl Tempo {
    pub fn new(tick: u32, value: u32) -> Self {
        Self {
            tick,
            value,
            actual_time: 0.0,
        }
    }

    pub fn bpm(&self) -> f64 {
        MICROSECONDS_PER_MINUTE / self.value as f64
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub tick: u32,
    pub numerator: u8,
    /// The note value of one beat (4 for quarter notes), not the raw power of two.
    pub denominator: u32,
}

impl TimeSignature {
    pub fn new(tick: u32, numerator: u8, denominator: u32) -> Self {
        Self {
            tick,
            numerator,
            denominator,
        }
    }

    /// Common time at `tick`.
    pub fn common(tick: u32) -> Self {
        Self::new(tick, 4, 4)
    }
}

/// Per-tick changes gathered by the note counter.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct TickInfo {
    pub polyphony_delta: i64,
    pub notes_passed_delta: u64,
    pub actual_time: f64,
}

impl TickInfo {
    pub fn absorb(&mut self, other: &TickInfo) {
        self.polyphony_delta += other.polyphony_delta;
        self.notes_passed_delta += other.notes_passed_delta;
    }
}
