//! City-wide time series and availability profiles.

use chrono::{DateTime, Datelike, TimeDelta, Timelike, Utc, Weekday};
use std::collections::BTreeMap;

use crate::analyzers::movement::station_activity_table;
use crate::analyzers::snapshot::group_by_station;
use crate::analyzers::types::{
    HeatmapCell, HourlyMean, NetChangePoint, StationSample, StationTrend, TrendPoint,
};
use crate::analyzers::utility::mean;
use crate::observation::Observation;

pub const TREND_BUCKET_MINUTES: i64 = 15;
pub const NET_CHANGE_BUCKET_MINUTES: i64 = 30;
/// Most active stations charted individually.
pub const TOP_TREND_STATIONS: usize = 5;

/// Sums of free bikes and empty slots keyed by bucket start (unix seconds).
///
/// Buckets between the first and last observed one are present with zero
/// sums. A non-positive bucket width yields no buckets.
fn bucket_sums(observations: &[Observation], bucket: TimeDelta) -> BTreeMap<i64, (u64, u64)> {
    let width = bucket.num_seconds();
    let mut sums: BTreeMap<i64, (u64, u64)> = BTreeMap::new();
    if width <= 0 {
        return sums;
    }

    for o in observations {
        let secs = o.observed_at.timestamp();
        let start = secs - secs.rem_euclid(width);
        let entry = sums.entry(start).or_default();
        entry.0 += u64::from(o.free_bikes);
        entry.1 += u64::from(o.empty_slots);
    }

    if let (Some(&first), Some(&last)) = (sums.keys().next(), sums.keys().next_back()) {
        let mut start = first;
        while start < last {
            sums.entry(start).or_default();
            start += width;
        }
    }

    sums
}

fn bucket_time(start: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(start, 0)
}

/// City-wide free bikes and empty slots per time bucket, oldest first.
pub fn citywide_trend(observations: &[Observation], bucket: TimeDelta) -> Vec<TrendPoint> {
    bucket_sums(observations, bucket)
        .into_iter()
        .filter_map(|(start, (free_bikes, empty_slots))| {
            Some(TrendPoint {
                bucket_start: bucket_time(start)?,
                free_bikes,
                empty_slots,
            })
        })
        .collect()
}

/// Total free bikes per bucket and the change from the previous bucket.
///
/// The first bucket reports a change of zero.
pub fn net_change(observations: &[Observation], bucket: TimeDelta) -> Vec<NetChangePoint> {
    let mut previous: Option<u64> = None;
    bucket_sums(observations, bucket)
        .into_iter()
        .filter_map(|(start, (total_bikes, _))| {
            let change = previous.map_or(0, |p| total_bikes as i64 - p as i64);
            previous = Some(total_bikes);
            Some(NetChangePoint {
                bucket_start: bucket_time(start)?,
                total_bikes,
                change,
            })
        })
        .collect()
}

/// Mean free bikes per UTC hour of day, for hours with observations.
pub fn hourly_profile(observations: &[Observation]) -> Vec<HourlyMean> {
    let mut by_hour: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for o in observations {
        by_hour
            .entry(o.observed_at.hour())
            .or_default()
            .push(o.free_bikes as f64);
    }

    by_hour
        .into_iter()
        .map(|(hour, values)| HourlyMean {
            hour,
            mean_free_bikes: mean(&values),
        })
        .collect()
}

/// Mean free bikes per (weekday, hour), Monday first.
pub fn weekday_hour_heatmap(observations: &[Observation]) -> Vec<HeatmapCell> {
    let mut cells: BTreeMap<(u32, u32), (Weekday, Vec<f64>)> = BTreeMap::new();
    for o in observations {
        let weekday = o.observed_at.weekday();
        cells
            .entry((weekday.num_days_from_monday(), o.observed_at.hour()))
            .or_insert_with(|| (weekday, Vec::new()))
            .1
            .push(o.free_bikes as f64);
    }

    cells
        .into_iter()
        .map(|((_, hour), (weekday, values))| HeatmapCell {
            weekday,
            hour,
            mean_free_bikes: mean(&values),
        })
        .collect()
}

/// Chronological free bike samples of the `limit` most active stations, in
/// activity order.
pub fn top_station_trends(observations: &[Observation], limit: usize) -> Vec<StationTrend> {
    let groups = group_by_station(observations);
    station_activity_table(observations, limit)
        .into_iter()
        .filter_map(|row| {
            let group = groups.get(row.station_id.as_str())?;
            Some(StationTrend {
                samples: group.iter().map(|o| StationSample::from(*o)).collect(),
                station_id: row.station_id,
                name: row.name,
            })
        })
        .collect()
}
