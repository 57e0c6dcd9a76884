use crate::error::LoadError;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod counter;
pub mod notes;

/// The surface a renderer or exporter sees: open a path, preload it once, then
/// read the fully populated result.
pub trait MidiLoader: Send + Sync {
    fn name(&self) -> &'static str;

    /// Records `path` for the next [`MidiLoader::preload`]. Nothing is parsed yet.
    fn open_file(&mut self, path: &Path) -> Result<(), LoadError>;

    /// Runs the whole decode pipeline. Does nothing once a load has completed.
    fn preload(&mut self) -> Result<(), LoadError>;

    /// Drops all parsed state. The opened path is kept.
    fn reset(&mut self);

    fn is_preloaded(&self) -> bool;

    fn track_count(&self) -> u16;

    /// Ticks per quarter note.
    fn division(&self) -> u16;

    fn note_count(&self) -> u64;

    /// Length of the piece in ticks.
    fn midi_time(&self) -> u32;

    fn duration_micros(&self) -> f64;

    fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_micros() / 1_000_000.0)
    }
}

/// Checks `path` and returns it for storage. Fails before any bytes are read.
pub(crate) fn checked_path(path: &Path) -> Result<PathBuf, LoadError> {
    if !path.is_file() {
        return Err(LoadError::FileNotFound(path.to_path_buf()));
    }
    Ok(path.to_path_buf())
}
