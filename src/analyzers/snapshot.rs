//! Latest-observation-per-station reduction and the shared per-station grouping.

use std::collections::BTreeMap;

use crate::observation::Observation;

/// Groups observations by station id, each group in chronological order.
///
/// The sort is stable, so observations sharing a timestamp keep their input
/// order. Groups iterate in ascending station id.
pub fn group_by_station(observations: &[Observation]) -> BTreeMap<&str, Vec<&Observation>> {
    let mut groups: BTreeMap<&str, Vec<&Observation>> = BTreeMap::new();
    for o in observations {
        groups.entry(o.station_id.as_str()).or_default().push(o);
    }
    for group in groups.values_mut() {
        group.sort_by_key(|o| o.observed_at);
    }
    groups
}

/// Reduces observations to the latest one per station, ordered by station id.
///
/// When several observations share the maximal timestamp, the one appearing
/// last in the input wins.
pub fn latest_snapshot(observations: &[Observation]) -> Vec<Observation> {
    group_by_station(observations)
        .into_values()
        .filter_map(|group| group.last().map(|o| (*o).clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::fixtures::{obs, t0};
    use chrono::TimeDelta;

    #[test]
    fn test_latest_per_station_regardless_of_input_order() {
        let later = t0() + TimeDelta::minutes(5);
        let input = vec![
            obs("S2", 7, 1, later),
            obs("S1", 4, 4, later),
            obs("S2", 1, 7, t0()),
            obs("S1", 2, 6, t0()),
        ];

        let snapshot = latest_snapshot(&input);
        assert_eq!(snapshot, vec![obs("S1", 4, 4, later), obs("S2", 7, 1, later)]);
    }

    #[test]
    fn test_equal_timestamps_keep_last_in_input() {
        let input = vec![obs("S1", 1, 0, t0()), obs("S1", 9, 0, t0())];
        let snapshot = latest_snapshot(&input);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].free_bikes, 9);
    }

    #[test]
    fn test_one_row_per_distinct_station() {
        let input: Vec<_> = (0..30)
            .map(|i| obs(&format!("S{}", i % 7), i, 0, t0() + TimeDelta::minutes(i as i64)))
            .collect();
        assert_eq!(latest_snapshot(&input).len(), 7);
    }

    #[test]
    fn test_empty_input() {
        assert!(latest_snapshot(&[]).is_empty());
    }
}
