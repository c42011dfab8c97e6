//! City-wide and per-station capacity and utilization.

use std::cmp::Ordering;

use crate::analyzers::types::{CapacityMetrics, SnapshotRow};
use crate::analyzers::utility::ratio;
use crate::observation::Observation;

/// Sums bikes and free docks over a snapshot.
///
/// Utilization is `0.0` when total capacity is zero, including for an empty
/// snapshot.
pub fn capacity_metrics(snapshot: &[SnapshotRow]) -> CapacityMetrics {
    let total_bikes: u64 = snapshot.iter().map(|r| u64::from(r.free_bikes)).sum();
    let total_docks: u64 = snapshot.iter().map(|r| u64::from(r.empty_slots)).sum();
    let total_capacity = total_bikes + total_docks;

    CapacityMetrics {
        total_bikes,
        total_docks,
        total_capacity,
        utilization: ratio(total_bikes as f64, total_capacity as f64),
    }
}

/// Builds the snapshot table from latest-per-station observations.
pub fn snapshot_table(latest: &[Observation]) -> Vec<SnapshotRow> {
    latest
        .iter()
        .map(|o| SnapshotRow {
            station_id: o.station_id.clone(),
            name: o.name.clone(),
            free_bikes: o.free_bikes,
            empty_slots: o.empty_slots,
            capacity: o.capacity(),
            utilization: o.utilization(),
            latitude: o.latitude,
            longitude: o.longitude,
            observed_at: o.observed_at,
        })
        .collect()
}

fn reported_capacity(row: &SnapshotRow) -> u32 {
    row.free_bikes + row.empty_slots
}

/// Stations with a non-zero reported capacity, most available first.
pub fn utilization_ranking(snapshot: &[SnapshotRow], limit: usize) -> Vec<SnapshotRow> {
    let mut ranked: Vec<SnapshotRow> = snapshot
        .iter()
        .filter(|r| reported_capacity(r) > 0)
        .cloned()
        .collect();
    ranked.sort_by(|a, b| {
        b.utilization
            .total_cmp(&a.utilization)
            .then_with(|| a.station_id.cmp(&b.station_id))
    });
    ranked.truncate(limit);
    ranked
}

/// Stations with `free_bikes <= threshold`, emptiest first.
///
/// Returns the untruncated count alongside the first `limit` rows.
pub fn critical_stations(
    snapshot: &[SnapshotRow],
    threshold: u32,
    limit: usize,
) -> (usize, Vec<SnapshotRow>) {
    let mut critical: Vec<SnapshotRow> = snapshot
        .iter()
        .filter(|r| r.free_bikes <= threshold)
        .cloned()
        .collect();
    let count = critical.len();
    critical.sort_by(|a, b| match a.free_bikes.cmp(&b.free_bikes) {
        Ordering::Equal => a.station_id.cmp(&b.station_id),
        other => other,
    });
    critical.truncate(limit);
    (count, critical)
}

/// Distribution of per-station utilization over `bins` equal bins of [0, 1].
///
/// Uses the reported capacity, counting zero-capacity stations as 0.
/// A utilization of exactly 1.0 falls in the last bin.
pub fn utilization_histogram(snapshot: &[SnapshotRow], bins: usize) -> Vec<usize> {
    if bins == 0 {
        return Vec::new();
    }

    let mut counts = vec![0; bins];
    for row in snapshot {
        let pct = ratio(row.free_bikes as f64, reported_capacity(row) as f64).clamp(0.0, 1.0);
        let bin = ((pct * bins as f64) as usize).min(bins - 1);
        counts[bin] += 1;
    }
    counts
}
