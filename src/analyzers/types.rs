//! Data types produced by the analytics pipeline.

use chrono::{DateTime, Utc, Weekday};
use serde::Serialize;

use crate::observation::Observation;

/// Summed free-bike movement of one station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementRecord {
    pub station_id: String,
    pub name: String,
    pub total_movement: f64,
}

/// The "most active station over the last 30 minutes" figure.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MostActive {
    pub name: Option<String>,
    pub movement: f64,
}

/// One row of the station activity leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRow {
    pub station_id: String,
    pub name: String,
    pub records: usize,
    pub avg_bikes: f64,
    pub avg_empty_slots: f64,
    pub total_moves: u64,
    pub turnover_rate: f64,
}

/// City-wide capacity rollup of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CapacityMetrics {
    pub total_bikes: u64,
    pub total_docks: u64,
    pub total_capacity: u64,
    pub utilization: f64,
}

/// Latest observation of a station with its capacity figures.
///
/// `capacity` never is zero, see [`crate::observation::Observation::capacity`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRow {
    pub station_id: String,
    pub name: String,
    pub free_bikes: u32,
    pub empty_slots: u32,
    pub capacity: u32,
    pub utilization: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub observed_at: DateTime<Utc>,
}

/// A station sampled often enough to expect turnover but whose stock is static.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyRecord {
    pub station_id: String,
    pub sample_count: usize,
    pub recent_min: u32,
    pub recent_max: u32,
    pub recent_range: u32,
    pub total_movement: f64,
}

/// Cluster membership of one station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAssignment {
    pub station_id: String,
    pub cluster: usize,
}

/// A cluster center in (latitude, longitude).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClusterResult {
    pub assignments: Vec<ClusterAssignment>,
    pub centers: Vec<GeoPoint>,
}

/// City-wide totals for one time bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub bucket_start: DateTime<Utc>,
    pub free_bikes: u64,
    pub empty_slots: u64,
}

/// Total free bikes of a bucket and its change versus the previous bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetChangePoint {
    pub bucket_start: DateTime<Utc>,
    pub total_bikes: u64,
    pub change: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyMean {
    pub hour: u32,
    pub mean_free_bikes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub weekday: Weekday,
    pub hour: u32,
    pub mean_free_bikes: f64,
}

/// History of a single station with its time spent at or below a threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationHistory {
    pub station_id: String,
    pub name: String,
    pub samples: Vec<StationSample>,
    pub below_share: f64,
    pub above_share: f64,
    /// Whether the stuck-bike detector flags this station.
    pub flagged_static: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSample {
    pub observed_at: DateTime<Utc>,
    pub free_bikes: u32,
    pub empty_slots: u32,
}

impl From<&Observation> for StationSample {
    fn from(o: &Observation) -> Self {
        Self {
            observed_at: o.observed_at,
            free_bikes: o.free_bikes,
            empty_slots: o.empty_slots,
        }
    }
}

/// Free bike series of one of the most active stations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationTrend {
    pub station_id: String,
    pub name: String,
    pub samples: Vec<StationSample>,
}

/// Everything one dashboard refresh needs, computed from a single read.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub window_hours: Option<u32>,
    pub history_rows: usize,
    pub station_count: usize,
    pub capacity: CapacityMetrics,
    pub most_active: MostActive,
    pub critical_threshold: u32,
    pub critical_count: usize,
    pub critical_stations: Vec<SnapshotRow>,
    pub top_available: Vec<SnapshotRow>,
    pub utilization_histogram: Vec<usize>,
    pub snapshot: Vec<SnapshotRow>,
    pub movement_ranking: Vec<MovementRecord>,
    pub activity: Vec<ActivityRow>,
    /// `None` when the history window holds no observations.
    pub anomalies: Option<Vec<AnomalyRecord>>,
    pub clusters: ClusterResult,
    pub citywide_trend: Vec<TrendPoint>,
    pub net_change: Vec<NetChangePoint>,
    pub hourly_profile: Vec<HourlyMean>,
    pub weekday_hour_heatmap: Vec<HeatmapCell>,
    pub top_station_trends: Vec<StationTrend>,
}
