//! One dashboard refresh: read the store once, evaluate every analyzer on
//! that single materialized set.

use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::info;

use crate::analyzers::anomaly::{AnomalyConfig, detect_static_bikes};
use crate::analyzers::capacity::{
    capacity_metrics, critical_stations, snapshot_table, utilization_histogram,
    utilization_ranking,
};
use crate::analyzers::cluster::{DEFAULT_CLUSTERS, SpatialClusterer};
use crate::analyzers::movement::{most_active_station, station_activity_table, station_movements};
use crate::analyzers::snapshot::latest_snapshot;
use crate::analyzers::trend::{
    NET_CHANGE_BUCKET_MINUTES, TOP_TREND_STATIONS, TREND_BUCKET_MINUTES, citywide_trend,
    hourly_profile, net_change, top_station_trends, weekday_hour_heatmap,
};
use crate::analyzers::types::Report;
use crate::analyzers::window::{filter_window, hours_window};
use crate::observation::Observation;
use crate::store::SnapshotStore;

/// Parameters of a report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportConfig {
    /// Trailing history window; `None` uses all stored data.
    pub window_hours: Option<u32>,
    pub top_n: usize,
    pub critical_threshold: u32,
    pub clusters: usize,
    pub histogram_bins: usize,
    pub anomaly: AnomalyConfig,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            window_hours: Some(1),
            top_n: 10,
            critical_threshold: 3,
            clusters: DEFAULT_CLUSTERS,
            histogram_bins: 20,
            anomaly: AnomalyConfig::default(),
        }
    }
}

/// Builds a report from an already loaded observation set.
///
/// The snapshot is the latest observation per station over the full input;
/// movement, activity, anomalies and trends use the trailing history window
/// ending at `now`.
pub fn build_report(
    observations: &[Observation],
    config: &ReportConfig,
    clusterer: &dyn SpatialClusterer,
    now: DateTime<Utc>,
) -> Report {
    let history = filter_window(observations, config.window_hours.map(hours_window), now);
    let snapshot = snapshot_table(&latest_snapshot(observations));

    let (critical_count, critical) =
        critical_stations(&snapshot, config.critical_threshold, config.top_n);
    let anomalies = if history.is_empty() {
        None
    } else {
        Some(detect_static_bikes(&history, &config.anomaly))
    };

    let report = Report {
        generated_at: now,
        window_hours: config.window_hours,
        history_rows: history.len(),
        station_count: snapshot.len(),
        capacity: capacity_metrics(&snapshot),
        most_active: most_active_station(&history, now),
        critical_threshold: config.critical_threshold,
        critical_count,
        critical_stations: critical,
        top_available: utilization_ranking(&snapshot, config.top_n),
        utilization_histogram: utilization_histogram(&snapshot, config.histogram_bins),
        movement_ranking: station_movements(&history),
        activity: station_activity_table(&history, config.top_n),
        anomalies,
        clusters: clusterer.cluster(&snapshot, config.clusters),
        citywide_trend: citywide_trend(&history, TimeDelta::minutes(TREND_BUCKET_MINUTES)),
        net_change: net_change(&history, TimeDelta::minutes(NET_CHANGE_BUCKET_MINUTES)),
        hourly_profile: hourly_profile(&history),
        weekday_hour_heatmap: weekday_hour_heatmap(&history),
        top_station_trends: top_station_trends(&history, TOP_TREND_STATIONS.min(config.top_n)),
        snapshot,
    };

    info!(
        stations = report.station_count,
        history_rows = report.history_rows,
        critical = report.critical_count,
        anomalies = report.anomalies.as_ref().map(Vec::len),
        "Report built"
    );

    report
}

/// Reads every observation from `store` and builds a report at `now`.
pub fn report_from_store(
    store: &impl SnapshotStore,
    config: &ReportConfig,
    clusterer: &dyn SpatialClusterer,
    now: DateTime<Utc>,
) -> Result<Report> {
    let observations = store.all_observations()?;
    Ok(build_report(&observations, config, clusterer, now))
}
