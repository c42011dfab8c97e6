use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped reading of a station's bike and dock counts.
///
/// Observations are written once by the poller and never mutated. The pair
/// `(station_id, observed_at)` identifies a reading, but duplicates at the
/// same instant are tolerated by every analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub station_id: String,
    pub name: String,
    pub free_bikes: u32,
    pub empty_slots: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub observed_at: DateTime<Utc>,
}

impl Observation {
    /// Reported capacity, `free_bikes + empty_slots`. May be zero.
    pub fn raw_capacity(&self) -> u32 {
        self.free_bikes + self.empty_slots
    }

    /// Capacity used for per-station ratios.
    ///
    /// A station reporting zero total slots is treated as having one slot,
    /// so its utilization becomes `free_bikes / 1` instead of a division by
    /// zero. This is an approximation, not a measured capacity.
    pub fn capacity(&self) -> u32 {
        self.raw_capacity().max(1)
    }

    /// Fraction of capacity currently holding bikes, using [`Self::capacity`].
    pub fn utilization(&self) -> f64 {
        self.free_bikes as f64 / self.capacity() as f64
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_capacity_zero_slots_is_one() {
        let o = obs("S1", 0, 0, t0());
        assert_eq!(o.raw_capacity(), 0);
        assert_eq!(o.capacity(), 1);
        assert_eq!(o.utilization(), 0.0);
    }

    #[test]
    fn test_utilization_normal_values() {
        let o = obs("S1", 3, 9, t0());
        assert_eq!(o.capacity(), 12);
        assert_eq!(o.utilization(), 0.25);
    }
}
