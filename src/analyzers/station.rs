//! Single-station views: name search and history.

use crate::analyzers::anomaly::{AnomalyConfig, detect_static_bikes};
use crate::analyzers::snapshot::group_by_station;
use crate::analyzers::types::{SnapshotRow, StationHistory, StationSample};
use crate::analyzers::utility::{mode, ratio};
use crate::observation::Observation;

/// Snapshot rows whose name contains `query`, ignoring case, ordered by name
/// then id. An empty query matches every station.
pub fn search_stations<'a>(snapshot: &'a [SnapshotRow], query: &str) -> Vec<&'a SnapshotRow> {
    let needle = query.trim().to_lowercase();
    let mut matches: Vec<&SnapshotRow> = snapshot
        .iter()
        .filter(|row| row.name.to_lowercase().contains(&needle))
        .collect();
    matches.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.station_id.cmp(&b.station_id)));
    matches
}

/// Chronological samples of one station and the share of them at or below
/// `critical_threshold` free bikes. `None` when the station was never seen.
pub fn station_history(
    observations: &[Observation],
    station_id: &str,
    critical_threshold: u32,
    anomaly: &AnomalyConfig,
) -> Option<StationHistory> {
    let groups = group_by_station(observations);
    let group = groups.get(station_id)?;

    let below = group
        .iter()
        .filter(|o| o.free_bikes <= critical_threshold)
        .count();
    let below_share = ratio(below as f64, group.len() as f64);

    let own: Vec<Observation> = group.iter().map(|o| (*o).clone()).collect();
    let flagged_static = !detect_static_bikes(&own, anomaly).is_empty();

    Some(StationHistory {
        station_id: station_id.to_string(),
        name: mode(group.iter().map(|o| o.name.as_str()))
            .unwrap_or(station_id)
            .to_string(),
        samples: group.iter().map(|o| StationSample::from(*o)).collect(),
        below_share,
        above_share: (1.0 - below_share).max(0.0),
        flagged_static,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::capacity::snapshot_table;
    use crate::observation::fixtures::{obs, t0};
    use chrono::TimeDelta;

    #[test]
    fn test_history_shares() {
        let input = vec![
            obs("S1", 5, 5, t0() + TimeDelta::minutes(10)),
            obs("S1", 1, 9, t0()),
            obs("S2", 0, 10, t0()),
            obs("S1", 3, 7, t0() + TimeDelta::minutes(20)),
            obs("S1", 8, 2, t0() + TimeDelta::minutes(30)),
        ];

        let history = station_history(&input, "S1", 3, &AnomalyConfig::default()).unwrap();
        assert_eq!(history.samples.len(), 4);
        assert_eq!(history.samples[0].free_bikes, 1);
        assert_eq!(history.below_share, 0.5);
        assert_eq!(history.above_share, 0.5);
        assert!(!history.flagged_static);
    }

    #[test]
    fn test_static_station_is_flagged() {
        let input: Vec<Observation> = (0..5)
            .map(|i| obs("S1", 4, 6, t0() + TimeDelta::minutes(i)))
            .collect();

        let history = station_history(&input, "S1", 3, &AnomalyConfig::default()).unwrap();
        assert!(history.flagged_static);
        assert_eq!(history.below_share, 0.0);
    }

    #[test]
    fn test_unknown_station() {
        let input = [obs("S1", 1, 1, t0())];
        assert!(station_history(&input, "S2", 3, &AnomalyConfig::default()).is_none());
    }

    #[test]
    fn test_search_by_name_substring() {
        let mut latest = vec![obs("S2", 1, 1, t0()), obs("S1", 1, 1, t0()), obs("S3", 1, 1, t0())];
        latest[0].name = "Gare Saint-Jean".to_string();
        latest[1].name = "Place de la Victoire".to_string();
        latest[2].name = "Saint-Michel".to_string();
        let snapshot = snapshot_table(&latest);

        let ids: Vec<&str> = search_stations(&snapshot, "saint")
            .iter()
            .map(|r| r.station_id.as_str())
            .collect();
        assert_eq!(ids, vec!["S2", "S3"]);
        assert_eq!(search_stations(&snapshot, "").len(), 3);
        assert!(search_stations(&snapshot, "Quinconces").is_empty());
    }
}
