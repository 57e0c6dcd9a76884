//! SMF container handling and the per-track fan-out.
//!
//! Only the header and the chunk table are read up front. Each track's bytes are
//! pulled from the shared source by the worker that decodes it and dropped as
//! soon as that worker is done, so at most the in-flight tracks are held in
//! memory at once.

use crate::error::LoadError;
use byteorder::{BigEndian, ReadBytesExt};
use log::{debug, info};
use rayon::prelude::*;
use std::io::{Read, Seek, SeekFrom};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmfHeader {
    pub format: u16,
    pub track_count: u16,
    /// Ticks per quarter note.
    pub division: u16,
}

/// Location of one `MTrk` payload inside the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackChunk {
    pub offset: u64,
    pub len: u32,
}

/// Reads and validates the `MThd` chunk.
pub fn read_header<R: Read>(reader: &mut R) -> Result<SmfHeader, LoadError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != b"MThd" {
        return Err(LoadError::BadHeaderMagic);
    }

    let len = reader.read_u32::<BigEndian>()?;
    if len != 6 {
        return Err(LoadError::BadHeaderLength(len));
    }

    let format = reader.read_u16::<BigEndian>()?;
    if format > 1 {
        return Err(LoadError::UnsupportedFormat(format));
    }

    let track_count = reader.read_u16::<BigEndian>()?;
    let division = reader.read_u16::<BigEndian>()?;

    info!("Track count: {}, division: {}..!", track_count, division);

    // Bit 15 marks SMPTE timing; 0 ticks per quarter cannot be integrated.
    if division == 0 || division > 0x7FFF {
        return Err(LoadError::UnsupportedDivision(division));
    }

    Ok(SmfHeader {
        format,
        track_count,
        division,
    })
}

/// Walks the `MTrk` headers following the file header, recording where each
/// payload lives without reading it.
pub fn scan_tracks<R: Read + Seek>(
    reader: &mut R,
    track_count: u16,
) -> Result<Vec<TrackChunk>, LoadError> {
    let mut chunks = Vec::with_capacity(track_count as usize);

    for track in 0..track_count as usize {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != b"MTrk" {
            return Err(LoadError::BadTrackMagic { track });
        }

        let len = reader.read_u32::<BigEndian>()?;
        let offset = reader.stream_position()?;
        reader.seek(SeekFrom::Current(len as i64))?;

        debug!("Track {}, size {}.", track, len);
        chunks.push(TrackChunk { offset, len });
    }

    Ok(chunks)
}

/// Runs `decode` on every track in parallel and returns the results in track
/// order.
///
/// Workers take turns on `source` only for the seek and read of their own chunk.
/// The chunk buffer is owned by the worker and freed when `decode` returns.
pub fn decode_tracks<R, T, F>(source: R, chunks: &[TrackChunk], decode: F) -> Result<Vec<T>, LoadError>
where
    R: Read + Seek + Send,
    T: Send,
    F: Fn(usize, &[u8]) -> Result<T, LoadError> + Sync,
{
    let source = Mutex::new(source);

    chunks
        .par_iter()
        .enumerate()
        .map(|(track, chunk)| {
            let data = read_chunk(&source, chunk)?;
            let parsed = decode(track, &data)?;
            debug!("Track {} parsed. (Size = {})", track, chunk.len);
            Ok(parsed)
        })
        .collect()
}

fn read_chunk<R: Read + Seek>(source: &Mutex<R>, chunk: &TrackChunk) -> Result<Vec<u8>, LoadError> {
    let mut data = vec![0u8; chunk.len as usize];

    let Ok(mut reader) = source.lock() else {
        return Err(LoadError::SourcePoisoned);
    };
    reader.seek(SeekFrom::Start(chunk.offset))?;
    reader.read_exact(&mut data)?;

    Ok(data)
}

/// Runs `job` on a dedicated pool of `threads` workers, or on the global pool.
pub fn with_pool<T, F>(threads: Option<usize>, job: F) -> Result<T, LoadError>
where
    T: Send,
    F: FnOnce() -> Result<T, LoadError> + Send,
{
    match threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
            pool.install(job)
        }
        None => job(),
    }
}
