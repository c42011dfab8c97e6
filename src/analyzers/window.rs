//! Trailing time-window restriction.

use chrono::{DateTime, TimeDelta, Utc};

use crate::observation::Observation;

/// Keeps observations with `observed_at >= now - window`.
///
/// `None` returns the full input unchanged, as does a window reaching back
/// past the earliest representable instant.
pub fn filter_window(
    observations: &[Observation],
    window: Option<TimeDelta>,
    now: DateTime<Utc>,
) -> Vec<Observation> {
    match window {
        None => observations.to_vec(),
        Some(window) => match now.checked_sub_signed(window) {
            Some(cutoff) => filter_since(observations, cutoff),
            None => observations.to_vec(),
        },
    }
}

/// Keeps observations with `observed_at >= cutoff`.
pub fn filter_since(observations: &[Observation], cutoff: DateTime<Utc>) -> Vec<Observation> {
    observations
        .iter()
        .filter(|o| o.observed_at >= cutoff)
        .cloned()
        .collect()
}

/// Restricts to the trailing `hours`, evaluating the current instant once.
pub fn filter_by_hours(observations: &[Observation], hours: Option<u32>) -> Vec<Observation> {
    filter_window(observations, hours.map(hours_window), Utc::now())
}

pub fn hours_window(hours: u32) -> TimeDelta {
    TimeDelta::hours(i64::from(hours))
}
