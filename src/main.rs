use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use midi_preload::{Args, MidiFile, MidiLoader, Mode, NoteCounter, format_duration};

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = args.loader_config();
    debug!("Loader config: {:?}", config);

    match args.mode {
        Mode::Notes => {
            let mut loader = MidiFile::new(config);
            load(&mut loader, &args)?;

            let Some(midi) = loader.data() else {
                return Ok(());
            };
            if let Some(tempo) = midi.tempos.first() {
                info!("Initial tempo: {:.2} BPM..!", tempo.bpm());
            }
            if let Some(signature) = midi.time_signatures.first() {
                info!(
                    "Initial time signature: {}/{}, {} changes..!",
                    signature.numerator,
                    signature.denominator,
                    midi.time_signatures.len() - 1
                );
            }

            if args.preview > 0 {
                info!("Previewing at most {} notes..!", args.preview);
                let mut notes: Vec<_> = midi.notes.iter().flatten().collect();
                notes.sort_by_key(|n| (n.start, n.track, n.key));
                for (i, note) in notes.into_iter().take(args.preview).enumerate() {
                    info!(
                        "Note {}: key={} vel={} track={} ticks={}..{} time_ms={:.3}",
                        i,
                        note.key,
                        note.velocity,
                        note.track,
                        note.start,
                        note.end,
                        midi.tick_to_micros(note.start) / 1000.0
                    );
                }
            }
        }
        Mode::Counter => {
            let mut loader = NoteCounter::new(config);
            load(&mut loader, &args)?;

            if let Some(peak) = loader.running_totals().map(|t| t.polyphony).max() {
                info!("Peak polyphony: {}..!", peak);
            }

            if args.preview > 0 {
                info!("Previewing at most {} ticks..!", args.preview);
                for total in loader.running_totals().take(args.preview) {
                    info!(
                        "Tick {}: polyphony={} passed={} time_ms={:.3}",
                        total.tick,
                        total.polyphony,
                        total.notes_passed,
                        total.actual_time / 1000.0
                    );
                }
            }
        }
    }

    Ok(())
}

fn load<L: MidiLoader>(loader: &mut L, args: &Args) -> Result<()> {
    info!("{}: opening '{}'...", loader.name(), args.midi.display());
    loader.open_file(&args.midi)?;
    loader.preload()?;

    info!(
        "Loaded {} tracks, {} notes, {} ticks at division {} ({})..!",
        loader.track_count(),
        loader.note_count(),
        loader.midi_time(),
        loader.division(),
        format_duration(loader.duration())
    );
    Ok(())
}
