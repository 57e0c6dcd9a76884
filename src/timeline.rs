//! Tempo and time-signature timelines.
//!
//! Both timelines are normalized the same way: a default entry when the file
//! has none, a stable sort by tick, and a synthetic entry at tick 0 when the
//! earliest one starts later. The tempo timeline is then integrated so every
//! entry knows its wall-clock position in microseconds.

use crate::model::note::{DEFAULT_TEMPO, Tempo, TickInfo, TimeSignature};
use crate::sort::stable_sort_by_tick;
use std::collections::BTreeMap;

pub fn normalize_tempos(tempos: &mut Vec<Tempo>) {
    if tempos.is_empty() {
        tempos.push(Tempo::new(0, DEFAULT_TEMPO));
    }
    stable_sort_by_tick(tempos, |t| t.tick);
    if tempos[0].tick > 0 {
        tempos.insert(0, Tempo::new(0, DEFAULT_TEMPO));
    }
}

pub fn normalize_time_signatures(signatures: &mut Vec<TimeSignature>) {
    if signatures.is_empty() {
        signatures.push(TimeSignature::common(0));
    }
    stable_sort_by_tick(signatures, |s| s.tick);
    if signatures[0].tick > 0 {
        signatures.insert(0, TimeSignature::common(0));
    }
}

/// Wall-clock length of `ticks` at `tempo` microseconds per quarter note.
#[inline]
fn span_micros(tempo: u32, ticks: u32, division: u16) -> f64 {
    tempo as f64 * ticks as f64 / division as f64
}

/// Fills in `actual_time` for a normalized tempo timeline and returns the
/// duration in microseconds of a piece that ends at `midi_time`.
pub fn assign_actual_time(tempos: &mut [Tempo], division: u16, midi_time: u32) -> f64 {
    let mut last_tick = 0u32;
    let mut last_time = 0.0f64;
    let mut last_value = DEFAULT_TEMPO;

    for tempo in tempos.iter_mut() {
        tempo.actual_time = last_time + span_micros(last_value, tempo.tick - last_tick, division);
        last_tick = tempo.tick;
        last_time = tempo.actual_time;
        last_value = tempo.value;
    }

    last_time + span_micros(last_value, midi_time.saturating_sub(last_tick), division)
}

/// Wall-clock position of `tick` on an integrated tempo timeline.
pub fn tick_to_micros(tempos: &[Tempo], division: u16, tick: u32) -> f64 {
    let index = tempos.partition_point(|t| t.tick <= tick);
    match index.checked_sub(1).map(|i| &tempos[i]) {
        Some(tempo) => tempo.actual_time + span_micros(tempo.value, tick - tempo.tick, division),
        None => span_micros(DEFAULT_TEMPO, tick, division),
    }
}

/// Fills in `actual_time` for every tick entry in one sweep, advancing through
/// the tempo timeline alongside the ordered keys.
pub fn assign_tick_times(tempos: &[Tempo], division: u16, ticks: &mut BTreeMap<u32, TickInfo>) {
    if tempos.is_empty() {
        return;
    }

    let mut current = 0;
    for (&tick, info) in ticks.iter_mut() {
        while current + 1 < tempos.len() && tempos[current + 1].tick <= tick {
            current += 1;
        }
        let tempo = &tempos[current];
        info.actual_time =
            tempo.actual_time + span_micros(tempo.value, tick.saturating_sub(tempo.tick), division);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ticks(tempos: &[Tempo]) -> Vec<u32> {
        tempos.iter().map(|t| t.tick).collect()
    }

    #[test]
    fn empty_timeline_gets_default_tempo() {
        let mut tempos = Vec::new();
        normalize_tempos(&mut tempos);
        assert_eq!(tempos, vec![Tempo::new(0, DEFAULT_TEMPO)]);
    }

    #[test]
    fn late_first_tempo_gets_anchor() {
        let mut tempos = vec![Tempo::new(960, 400_000), Tempo::new(480, 600_000)];
        normalize_tempos(&mut tempos);

        assert_eq!(ticks(&tempos), vec![0, 480, 960]);
        assert_eq!(tempos[0].value, DEFAULT_TEMPO);
        assert_eq!(tempos[1].value, 600_000);
    }

    #[test]
    fn anchor_invariant_holds_for_any_input() {
        let inputs: Vec<Vec<u32>> = vec![vec![], vec![0], vec![5], vec![7, 0, 7], vec![100, 3, 50, 3]];

        for input in inputs {
            let mut tempos: Vec<_> = input.iter().map(|&tick| Tempo::new(tick, 300_000)).collect();
            normalize_tempos(&mut tempos);

            assert_eq!(tempos[0].tick, 0);
            assert!(tempos.windows(2).all(|w| w[0].tick <= w[1].tick));
        }
    }

    #[test]
    fn equal_ticks_keep_file_order() {
        let mut tempos = vec![
            Tempo::new(10, 1),
            Tempo::new(0, 2),
            Tempo::new(10, 3),
            Tempo::new(10, 4),
        ];
        normalize_tempos(&mut tempos);

        let values: Vec<_> = tempos.iter().map(|t| t.value).collect();
        assert_eq!(values, vec![2, 1, 3, 4]);
    }

    #[test]
    fn time_signatures_normalize_like_tempos() {
        let mut signatures = Vec::new();
        normalize_time_signatures(&mut signatures);
        assert_eq!(signatures, vec![TimeSignature::common(0)]);

        let mut signatures = vec![TimeSignature::new(1920, 3, 4)];
        normalize_time_signatures(&mut signatures);
        assert_eq!(
            signatures,
            vec![TimeSignature::common(0), TimeSignature::new(1920, 3, 4)]
        );
    }

    #[test]
    fn integrates_piecewise() {
        // 120 BPM for one beat, then 60 BPM for two beats.
        let mut tempos = vec![Tempo::new(0, 500_000), Tempo::new(480, 1_000_000)];
        let duration = assign_actual_time(&mut tempos, 480, 1440);

        assert_eq!(tempos[0].actual_time, 0.0);
        assert_eq!(tempos[1].actual_time, 500_000.0);
        assert_eq!(duration, 2_500_000.0);

        assert_eq!(tick_to_micros(&tempos, 480, 240), 250_000.0);
        assert_eq!(tick_to_micros(&tempos, 480, 960), 1_500_000.0);
    }

    #[test]
    fn actual_time_is_monotonic() {
        let mut tempos = vec![
            Tempo::new(0, 250_000),
            Tempo::new(0, 700_000),
            Tempo::new(96, 1),
            Tempo::new(96, 16_777_215),
            Tempo::new(5000, 480_000),
        ];
        assign_actual_time(&mut tempos, 96, 6000);
        assert!(tempos.windows(2).all(|w| w[0].actual_time <= w[1].actual_time));
    }

    #[test]
    fn tick_times_follow_tempo_changes() {
        let mut tempos = vec![Tempo::new(0, 500_000), Tempo::new(480, 1_000_000)];
        assign_actual_time(&mut tempos, 480, 960);

        let mut map: BTreeMap<u32, TickInfo> = [0, 240, 480, 720]
            .into_iter()
            .map(|tick| (tick, TickInfo::default()))
            .collect();
        assign_tick_times(&tempos, 480, &mut map);

        let times: Vec<_> = map.values().map(|info| info.actual_time).collect();
        assert_eq!(times, vec![0.0, 250_000.0, 500_000.0, 1_000_000.0]);
    }
}
