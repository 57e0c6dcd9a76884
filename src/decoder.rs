//! Event decoding for a single `MTrk` chunk.
//!
//! The decoder walks the raw track bytes with MIDI running status and hands out
//! only the events the loaders care about. Everything else is skipped by its
//! encoded length and reported as [`TrackEvent::Other`]. Traversal ends at the
//! end-of-track meta event; the declared chunk length is only used to bound the
//! cursor.

use crate::cursor::{ByteCursor, EndOfBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEvent {
    NoteOn { key: u8, velocity: u8 },
    /// Also produced for note-on events with zero velocity.
    NoteOff { key: u8 },
    /// Microseconds per quarter note.
    Tempo(u32),
    TimeSignature { numerator: u8, denominator: u32 },
    EndOfTrack,
    Other,
}

#[derive(Debug, Clone)]
pub struct TrackDecoder<'a> {
    cursor: ByteCursor<'a>,
    tick: u32,
    running_status: u8,
    time_signatures: bool,
    finished: bool,
}

impl<'a> TrackDecoder<'a> {
    /// `time_signatures` selects whether meta 0x58 is decoded or skipped like any
    /// other meta event.
    pub fn new(data: &'a [u8], time_signatures: bool) -> Self {
        Self {
            cursor: ByteCursor::new(data),
            tick: 0,
            running_status: 0,
            time_signatures,
            finished: false,
        }
    }

    /// Absolute tick of the most recently decoded event.
    #[inline]
    pub fn tick(&self) -> u32 {
        self.tick
    }

    #[cfg(test)]
    pub(crate) fn position(&self) -> usize {
        self.cursor.position()
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    /// Decodes the next event. Returns `Ok(None)` once end-of-track was seen.
    pub fn next_event(&mut self) -> Result<Option<TrackEvent>, EndOfBuffer> {
        if self.finished {
            return Ok(None);
        }

        let delta = self.cursor.read_vlq()?;
        self.tick = self.tick.wrapping_add(delta);

        let mut status = self.cursor.peek_u8()?;
        if status < 0x80 {
            status = self.running_status;
        } else {
            self.cursor.skip(1)?;
        }
        self.running_status = status;

        let event = match status & 0xF0 {
            0x80 => {
                let key = self.cursor.read_u8()? & 0x7F;
                self.cursor.skip(1)?;
                TrackEvent::NoteOff { key }
            }
            0x90 => {
                let key = self.cursor.read_u8()? & 0x7F;
                let velocity = self.cursor.read_u8()?;
                if velocity == 0 {
                    TrackEvent::NoteOff { key }
                } else {
                    TrackEvent::NoteOn { key, velocity }
                }
            }
            0xA0 | 0xB0 | 0xE0 => {
                self.cursor.skip(2)?;
                TrackEvent::Other
            }
            0xC0 | 0xD0 => {
                self.cursor.skip(1)?;
                TrackEvent::Other
            }
            0xF0 => self.system_event(status)?,
            // A data byte before any status byte was seen: nothing to consume.
            _ => TrackEvent::Other,
        };

        Ok(Some(event))
    }

    fn system_event(&mut self, status: u8) -> Result<TrackEvent, EndOfBuffer> {
        match status {
            0xF0 => {
                while self.cursor.read_u8()? != 0xF7 {}
            }
            0xF1 => {}
            // Song position carries 2 data bytes, song select carries 1.
            0xF2 | 0xF3 => self.cursor.skip((0xF4 - status) as usize)?,
            0xFF => return self.meta_event(),
            _ => {}
        }
        Ok(TrackEvent::Other)
    }

    fn meta_event(&mut self) -> Result<TrackEvent, EndOfBuffer> {
        let kind = self.cursor.read_u8()?;
        match kind {
            0x2F => {
                // The length byte is normally 0x00; tolerate files that omit it.
                self.cursor.skip_saturating(1);
                self.finished = true;
                Ok(TrackEvent::EndOfTrack)
            }
            0x51 => {
                let _len = self.cursor.read_vlq()?;
                Ok(TrackEvent::Tempo(self.cursor.read_u24_be()?))
            }
            0x58 if self.time_signatures => {
                let _len = self.cursor.read_vlq()?;
                let numerator = self.cursor.read_u8()?;
                let power = self.cursor.read_u8()?;
                // metronome clocks, 32nd notes per beat
                self.cursor.skip(2)?;
                Ok(TrackEvent::TimeSignature {
                    numerator,
                    denominator: 2u32.saturating_pow(power as u32),
                })
            }
            _ => {
                let len = self.cursor.read_vlq()?;
                self.cursor.skip(len as usize)?;
                Ok(TrackEvent::Other)
            }
        }
    }
}
