use thiserror::Error;

/// A read ran past the end of the buffer the cursor was created over.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("read past end of track data at offset {offset}")]
pub struct EndOfBuffer {
    pub offset: usize,
}

/// Forward-only big-endian reader over one track's raw bytes.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    #[cfg(test)]
    pub(crate) fn position(&self) -> usize {
        self.offset
    }

    #[cfg(test)]
    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    #[inline]
    pub fn peek_u8(&self) -> Result<u8, EndOfBuffer> {
        self.data
            .get(self.offset)
            .copied()
            .ok_or(EndOfBuffer { offset: self.offset })
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, EndOfBuffer> {
        let byte = self.peek_u8()?;
        self.offset += 1;
        Ok(byte)
    }

    pub fn read_u16_be(&mut self) -> Result<u16, EndOfBuffer> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Reads the 3-byte big-endian value used by the set-tempo meta event.
    pub fn read_u24_be(&mut self) -> Result<u32, EndOfBuffer> {
        let bytes = self.take(3)?;
        Ok(((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | bytes[2] as u32)
    }

    pub fn read_u32_be(&mut self) -> Result<u32, EndOfBuffer> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Decodes a MIDI variable-length quantity.
    ///
    /// Each byte contributes its low 7 bits, most significant group first, and the
    /// quantity ends after the first byte with a clear high bit. Bits shifted out of
    /// the 32-bit accumulator are dropped, so over-long encodings wrap instead of
    /// failing.
    #[inline]
    pub fn read_vlq(&mut self) -> Result<u32, EndOfBuffer> {
        let mut value = 0u32;
        loop {
            let byte = self.read_u8()?;
            value = (value << 7) | (byte & 0x7F) as u32;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
    }

    pub fn skip(&mut self, count: usize) -> Result<(), EndOfBuffer> {
        self.take(count).map(|_| ())
    }

    /// Advances by up to `count` bytes, stopping at the end of the buffer.
    pub fn skip_saturating(&mut self, count: usize) {
        self.offset = self.offset.saturating_add(count).min(self.data.len());
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], EndOfBuffer> {
        let end = self
            .offset
            .checked_add(count)
            .filter(|&end| end <= self.data.len())
            .ok_or(EndOfBuffer {
                offset: self.data.len(),
            })?;
        let bytes = &self.data[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }
}

#[cfg(test)]
pub(crate) fn encode_vlq(mut value: u32) -> Vec<u8> {
    let mut groups = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        groups.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
    groups.reverse();
    groups
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reads_fixed_width_big_endian() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x01, 0x02];
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(cursor.read_u8().unwrap(), 0x12);
        assert_eq!(cursor.read_u16_be().unwrap(), 0x3456);
        assert_eq!(cursor.read_u32_be().unwrap(), 0x789A_BCDE);
        assert_eq!(cursor.read_u24_be().unwrap(), 0xF0_0102);
        assert!(cursor.is_empty());
        assert_eq!(cursor.read_u8(), Err(EndOfBuffer { offset: 10 }));
    }

    #[test]
    fn vlq_known_encodings() {
        let cases: &[(&[u8], u32)] = &[
            (&[0x00], 0),
            (&[0x40], 0x40),
            (&[0x7F], 0x7F),
            (&[0x81, 0x00], 0x80),
            (&[0xC0, 0x00], 0x2000),
            (&[0xFF, 0x7F], 0x3FFF),
            (&[0x81, 0x80, 0x00], 0x4000),
            (&[0xFF, 0xFF, 0x7F], 0x1F_FFFF),
            (&[0x81, 0x80, 0x80, 0x00], 0x20_0000),
            (&[0xFF, 0xFF, 0xFF, 0x7F], 0x0FFF_FFFF),
        ];

        for (bytes, expected) in cases {
            let mut cursor = ByteCursor::new(bytes);
            assert_eq!(cursor.read_vlq().unwrap(), *expected, "{:02X?}", bytes);
            assert!(cursor.is_empty());
        }
    }

    #[test]
    fn vlq_round_trips_across_range() {
        // Every group boundary plus a sparse walk over the full 28-bit range.
        let boundaries = [0u32, 0x7F, 0x80, 0x3FFF, 0x4000, 0x1F_FFFF, 0x20_0000, 0x0FFF_FFFF];
        let walk = (0..=0x0FFF_FFFFu32).step_by(65_521);

        for value in boundaries.into_iter().chain(walk) {
            let encoded = encode_vlq(value);
            let mut cursor = ByteCursor::new(&encoded);
            assert_eq!(cursor.read_vlq().unwrap(), value);
            assert_eq!(cursor.position(), encoded.len());
        }
    }

    #[test]
    fn unterminated_vlq_hits_end() {
        let mut cursor = ByteCursor::new(&[0x81, 0x80]);
        assert_eq!(cursor.read_vlq(), Err(EndOfBuffer { offset: 2 }));
    }

    #[test]
    fn skip_is_bounded() {
        let mut cursor = ByteCursor::new(&[1, 2, 3]);
        cursor.skip(2).unwrap();
        assert_eq!(cursor.remaining(), 1);
        assert!(cursor.skip(2).is_err());

        cursor.skip_saturating(10);
        assert!(cursor.is_empty());
    }
}
