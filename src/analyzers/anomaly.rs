//! Stuck-bike detection: stations that are sampled regularly but whose free
//! bike count does not move.

use chrono::TimeDelta;
use serde::Serialize;
use tracing::debug;

use crate::analyzers::movement::total_movement;
use crate::analyzers::snapshot::group_by_station;
use crate::analyzers::types::AnomalyRecord;
use crate::observation::Observation;

/// Thresholds of the static-bike detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnomalyConfig {
    /// Recency horizon, measured back from each station's latest sample.
    pub window_minutes: u32,
    /// Minimum samples inside the horizon for a station to count as active.
    pub activity_threshold: usize,
    /// Maximum movement for a station to count as stuck.
    pub static_threshold: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            window_minutes: 15,
            activity_threshold: 5,
            static_threshold: 1.0,
        }
    }
}

/// Returns the stations that are active but static, ordered by station id.
///
/// For each station the recent sub-window ends at that station's own latest
/// observation, not at wall-clock time. `sample_count` and the min/max/range
/// are taken over the sub-window while `total_movement` covers every
/// observation of the station in `observations`.
///
/// A station seen only once has zero movement and zero range; it is flagged
/// whenever `activity_threshold <= 1`. A horizon reaching back past the
/// earliest representable instant covers the whole station history.
pub fn detect_static_bikes(
    observations: &[Observation],
    config: &AnomalyConfig,
) -> Vec<AnomalyRecord> {
    let window = TimeDelta::try_minutes(i64::from(config.window_minutes));
    let groups = group_by_station(observations);
    let station_count = groups.len();

    let flagged: Vec<AnomalyRecord> = groups
        .into_iter()
        .filter_map(|(station_id, group)| {
            let latest = group.last()?.observed_at;
            let cutoff = window.and_then(|w| latest.checked_sub_signed(w));
            let recent: Vec<u32> = group
                .iter()
                .filter(|o| cutoff.is_none_or(|c| o.observed_at >= c))
                .map(|o| o.free_bikes)
                .collect();

            let sample_count = recent.len();
            let recent_min = recent.iter().copied().min()?;
            let recent_max = recent.iter().copied().max()?;
            let movement = total_movement(&group);

            let active = sample_count >= config.activity_threshold;
            let stuck = movement <= config.static_threshold;
            (active && stuck).then(|| AnomalyRecord {
                station_id: station_id.to_string(),
                sample_count,
                recent_min,
                recent_max,
                recent_range: recent_max - recent_min,
                total_movement: movement,
            })
        })
        .collect();

    debug!(stations = station_count, flagged = flagged.len(), "Static bike detection complete");
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::fixtures::{obs, t0};

    fn hourly(station: &str, bikes: &[u32]) -> Vec<Observation> {
        bikes
            .iter()
            .enumerate()
            .map(|(i, b)| obs(station, *b, 20 - b, t0() + TimeDelta::hours(i as i64)))
            .collect()
    }

    fn config(
        window_minutes: u32,
        activity_threshold: usize,
        static_threshold: f64,
    ) -> AnomalyConfig {
        AnomalyConfig {
            window_minutes,
            activity_threshold,
            static_threshold,
        }
    }

    #[test]
    fn test_moving_station_is_not_flagged() {
        let input = hourly("S1", &[5, 3, 3]);
        assert!(detect_static_bikes(&input, &config(120, 2, 1.0)).is_empty());
    }

    #[test]
    fn test_static_station_is_flagged() {
        let input = hourly("S1", &[4, 4, 4]);
        let flagged = detect_static_bikes(&input, &config(120, 2, 0.0));
        assert_eq!(
            flagged,
            vec![AnomalyRecord {
                station_id: "S1".to_string(),
                sample_count: 3,
                recent_min: 4,
                recent_max: 4,
                recent_range: 0,
                total_movement: 0.0,
            }]
        );
    }

    #[test]
    fn test_too_few_recent_samples_is_not_flagged() {
        let input = hourly("S1", &[4, 4, 4]);
        // Only the latest sample falls within 30 minutes of itself.
        assert!(detect_static_bikes(&input, &config(30, 2, 0.0)).is_empty());
    }

    #[test]
    fn test_sub_window_is_relative_to_station_latest() {
        let mut input = hourly("STALE", &[2, 2, 2]);
        input.extend(
            [7, 7, 7]
                .iter()
                .enumerate()
                .map(|(i, b)| obs("FRESH", *b, 0, t0() + TimeDelta::hours(48 + i as i64))),
        );

        let flagged = detect_static_bikes(&input, &config(180, 3, 0.0));
        let ids: Vec<&str> = flagged.iter().map(|r| r.station_id.as_str()).collect();
        assert_eq!(ids, vec!["FRESH", "STALE"]);
    }

    #[test]
    fn test_recent_range_and_full_movement() {
        let input = hourly("S1", &[0, 1, 3, 3]);
        let flagged = detect_static_bikes(&input, &config(60, 2, 3.0));
        assert_eq!(flagged.len(), 1);
        let record = &flagged[0];
        assert_eq!(record.sample_count, 2);
        assert_eq!(record.recent_min, 3);
        assert_eq!(record.recent_max, 3);
        assert_eq!(record.recent_range, 0);
        assert_eq!(record.total_movement, 3.0);
    }

    #[test]
    fn test_single_sample_station_flagged_with_low_bar() {
        let input = hourly("S1", &[6]);
        let flagged = detect_static_bikes(&input, &config(15, 1, 0.0));
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].recent_range, 0);
        assert_eq!(flagged[0].recent_min, 6);
        assert!(detect_static_bikes(&input, &config(15, 2, 0.0)).is_empty());
    }

    #[test]
    fn test_huge_horizon_covers_whole_history() {
        let input = hourly("S1", &[4, 4, 4]);
        let flagged = detect_static_bikes(&input, &config(u32::MAX, 3, 0.0));
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].sample_count, 3);
    }

    #[test]
    fn test_zero_horizon_keeps_latest_sample() {
        let input = hourly("S1", &[4, 4]);
        let flagged = detect_static_bikes(&input, &config(0, 0, 0.0));
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].sample_count, 1);
        assert_eq!(flagged[0].recent_min, 4);
    }

    #[test]
    fn test_empty_input() {
        assert!(detect_static_bikes(&[], &AnomalyConfig::default()).is_empty());
    }
}
