use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Pipeline switches shared by both loaders.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct LoaderConfig {
    /// Trim notes that overlap their successor on the same key after sorting.
    pub resolve_overlaps: bool,

    /// Decode time-signature meta events and build the signature timeline.
    pub time_signatures: bool,

    /// Size of a dedicated worker pool. `None` runs on rayon's global pool.
    pub threads: Option<usize>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            resolve_overlaps: false,
            time_signatures: true,
            threads: None,
        }
    }
}

#[derive(ValueEnum, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Reconstruct individual notes per key.
    #[default]
    Notes,
    /// Count polyphony and passed notes per tick.
    Counter,
}

#[derive(Parser, Debug)]
#[command(
    name = "midi-preload",
    about = "Preload a MIDI file and summarize its notes and tempo map."
)]
pub struct Args {
    /// Path to the target MIDI file.
    pub midi: PathBuf,

    /// What to reconstruct from the file.
    #[arg(short, long, value_enum, default_value_t = Mode::Notes)]
    pub mode: Mode,

    /// Trim notes that overlap the next note on the same key.
    #[arg(short, long, default_value_t = false)]
    pub resolve_overlaps: bool,

    /// Skip time-signature decoding.
    #[arg(long = "no-time-signatures", default_value_t = false)]
    pub no_time_signatures: bool,

    /// Number of worker threads (defaults to one per core).
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Print at most N notes (or tick entries in counter mode) after loading.
    #[arg(short, long, default_value_t = 0)]
    pub preview: usize,

    /// Prints extra information to the terminal.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            resolve_overlaps: self.resolve_overlaps,
            time_signatures: !self.no_time_signatures,
            threads: self.threads,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn args_map_to_config() {
        let args = Args::parse_from(["midi-preload", "song.mid", "-r", "--no-time-signatures", "-t", "3"]);
        let config = args.loader_config();

        assert_eq!(args.mode, Mode::Notes);
        assert!(config.resolve_overlaps);
        assert!(!config.time_signatures);
        assert_eq!(config.threads, Some(3));
    }

    #[test]
    fn counter_mode_flag() {
        let args = Args::parse_from(["midi-preload", "song.mid", "--mode", "counter"]);
        assert_eq!(args.mode, Mode::Counter);
        assert_eq!(args.loader_config(), LoaderConfig::default());
    }
}
