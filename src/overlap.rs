use crate::model::note::Note;
use rayon::prelude::*;

/// Keys with fewer notes than this are left untouched.
const MIN_NOTES: usize = 10;

/// Trims overlapping notes on every key buffer in parallel.
pub fn resolve_overlaps(buffers: &mut [Vec<Note>]) {
    buffers
        .par_iter_mut()
        .for_each(|notes| resolve_key_overlaps(notes));
}

/// Walks one sorted key buffer and removes overlap between each note and its
/// successor.
///
/// A note that ends inside its successor is cut at the successor's start. A note
/// that starts together with its successor and does not outlast it is collapsed
/// to zero length.
pub fn resolve_key_overlaps(notes: &mut [Note]) {
    if notes.len() < MIN_NOTES {
        return;
    }

    // The last pair is resolved too.
    for index in 0..notes.len() - 1 {
        let next = notes[index + 1];
        let curr = &mut notes[index];
        if curr.start < next.start && curr.end > next.start && curr.end < next.end {
            curr.end = next.start;
        } else if curr.start == next.start && curr.end <= next.end {
            curr.end = curr.start;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn note(start: u32, end: u32) -> Note {
        Note {
            key: 60,
            velocity: 100,
            track: 0,
            start,
            end,
        }
    }

    fn padded(mut notes: Vec<Note>) -> Vec<Note> {
        // Disjoint filler so the buffer reaches the minimum size.
        let base = notes.iter().map(|n| n.end).max().unwrap_or(0) + 100;
        notes.extend((0..MIN_NOTES as u32).map(|i| note(base + i * 10, base + i * 10 + 5)));
        notes
    }

    #[test]
    fn truncates_note_ending_inside_successor() {
        let mut notes = padded(vec![note(0, 50), note(20, 80)]);
        resolve_key_overlaps(&mut notes);

        assert_eq!((notes[0].start, notes[0].end), (0, 20));
        assert_eq!((notes[1].start, notes[1].end), (20, 80));
    }

    #[test]
    fn collapses_note_sharing_start() {
        let mut notes = padded(vec![note(40, 60), note(40, 90)]);
        resolve_key_overlaps(&mut notes);

        assert_eq!(notes[0].end, 40);
        assert_eq!(notes[1].end, 90);
    }

    #[test]
    fn keeps_enclosing_note() {
        let mut notes = padded(vec![note(0, 100), note(10, 20), note(40, 60), note(40, 50)]);
        resolve_key_overlaps(&mut notes);

        assert_eq!(notes[0].end, 100);
        assert_eq!(notes[1].end, 20);
        // longer note first on a shared start is not collapsed
        assert_eq!(notes[2].end, 60);
    }

    #[test]
    fn resolves_final_pair() {
        let mut notes: Vec<_> = (0..9u32).map(|i| note(i * 100, i * 100 + 50)).collect();
        notes.push(note(1990, 2050));
        notes.push(note(2000, 2100));
        resolve_key_overlaps(&mut notes);

        assert_eq!(notes[9].end, 2000);
        assert_eq!(notes[10].end, 2100);
    }

    #[test]
    fn short_buffers_are_untouched() {
        let mut notes = vec![note(0, 50), note(20, 80)];
        resolve_key_overlaps(&mut notes);
        assert_eq!(notes[0].end, 50);
    }

    #[test]
    fn running_twice_matches_running_once() {
        let mut notes = Vec::new();
        for i in 0..200u32 {
            let start = (i * 37) % 400;
            notes.push(note(start, start + 1 + (i * 13) % 90));
        }
        notes.sort_by_key(|n| n.start);

        let mut once = notes.clone();
        resolve_key_overlaps(&mut once);
        let mut twice = once.clone();
        resolve_key_overlaps(&mut twice);

        assert_eq!(once, twice);
        for pair in once.windows(2) {
            assert!(!(pair[0].start < pair[1].start && pair[0].end > pair[1].start && pair[0].end < pair[1].end));
        }
    }

    #[test]
    fn resolves_all_buffers() {
        let mut buffers = vec![padded(vec![note(0, 50), note(20, 80)]); 3];
        resolve_overlaps(&mut buffers);
        assert!(buffers.iter().all(|notes| notes[0].end == 20));
    }
}
