//! Per-station movement: the summed absolute change of free bikes between
//! consecutive observations.

use chrono::{DateTime, TimeDelta, Utc};
use std::cmp::Ordering;
use tracing::debug;

use crate::analyzers::snapshot::group_by_station;
use crate::analyzers::types::{ActivityRow, MostActive, MovementRecord};
use crate::analyzers::utility::{mean, mode, round_to};
use crate::analyzers::window::{filter_since, filter_window};
use crate::observation::Observation;

/// Fixed look-back of the "most active station" figure.
pub const MOST_ACTIVE_WINDOW_MINUTES: i64 = 30;

/// Sum of absolute consecutive differences of `free_bikes`.
///
/// `group` must already be in chronological order. The first observation has
/// no predecessor and contributes zero.
pub fn total_movement(group: &[&Observation]) -> f64 {
    group
        .windows(2)
        .map(|pair| (i64::from(pair[1].free_bikes) - i64::from(pair[0].free_bikes)).abs() as f64)
        .sum()
}

/// Descending movement, then ascending station id.
fn by_movement_desc(a: &MovementRecord, b: &MovementRecord) -> Ordering {
    b.total_movement
        .total_cmp(&a.total_movement)
        .then_with(|| a.station_id.cmp(&b.station_id))
}

/// Movement per station over the whole input, most active first.
pub fn station_movements(observations: &[Observation]) -> Vec<MovementRecord> {
    let mut records: Vec<MovementRecord> = group_by_station(observations)
        .into_iter()
        .map(|(station_id, group)| MovementRecord {
            station_id: station_id.to_string(),
            name: mode(group.iter().map(|o| o.name.as_str()))
                .unwrap_or(station_id)
                .to_string(),
            total_movement: total_movement(&group),
        })
        .collect();

    records.sort_by(by_movement_desc);
    records
}

/// Movement ranking over an optional trailing window ending at `now`.
pub fn aggregate_movement(
    observations: &[Observation],
    window: Option<TimeDelta>,
    now: DateTime<Utc>,
) -> Vec<MovementRecord> {
    let windowed = filter_window(observations, window, now);
    let records = station_movements(&windowed);
    debug!(
        input = observations.len(),
        windowed = windowed.len(),
        stations = records.len(),
        "Movement aggregated"
    );
    records
}

/// Station with the most movement over the last 30 minutes before `now`.
///
/// Ignores any dashboard window; returns `(None, 0)` when nothing was
/// observed in the last 30 minutes.
pub fn most_active_station(observations: &[Observation], now: DateTime<Utc>) -> MostActive {
    let recent = filter_since(observations, now - TimeDelta::minutes(MOST_ACTIVE_WINDOW_MINUTES));

    match station_movements(&recent).into_iter().next() {
        Some(top) => MostActive {
            name: Some(top.name),
            movement: top.total_movement,
        },
        None => MostActive::default(),
    }
}

/// Per-station activity summary, most active first, truncated to `limit`.
pub fn station_activity_table(observations: &[Observation], limit: usize) -> Vec<ActivityRow> {
    let groups = group_by_station(observations);

    let mut ranked: Vec<(MovementRecord, ActivityRow)> = groups
        .into_iter()
        .map(|(station_id, group)| {
            let moves = total_movement(&group);
            let records = group.len();
            let bikes: Vec<f64> = group.iter().map(|o| o.free_bikes as f64).collect();
            let slots: Vec<f64> = group.iter().map(|o| o.empty_slots as f64).collect();
            let name = mode(group.iter().map(|o| o.name.as_str()))
                .unwrap_or(station_id)
                .to_string();

            let key = MovementRecord {
                station_id: station_id.to_string(),
                name: name.clone(),
                total_movement: moves,
            };
            let row = ActivityRow {
                station_id: station_id.to_string(),
                name,
                records,
                avg_bikes: round_to(mean(&bikes), 1),
                avg_empty_slots: round_to(mean(&slots), 1),
                total_moves: moves.round() as u64,
                turnover_rate: round_to(moves / records.max(1) as f64, 2),
            };
            (key, row)
        })
        .collect();

    ranked.sort_by(|(a, _), (b, _)| by_movement_desc(a, b));
    ranked.into_iter().take(limit).map(|(_, row)| row).collect()
}
