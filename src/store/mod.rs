//! Append-only observation storage.
//!
//! [`SnapshotStore`] is the read side the analytics call into and
//! [`SnapshotSink`] the write side the poller feeds.
//! [`CsvSnapshotStore`] keeps one CSV file per network and day on disk.
//! [`MemoryStore`] holds observations in a `Vec`, for tests and embedding.

mod csv_dir;
mod memory;

pub use csv_dir::CsvSnapshotStore;
pub use memory::MemoryStore;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::observation::Observation;

/// Read access to the station observation log.
///
/// Read order is not guaranteed; every analyzer sorts what it needs.
pub trait SnapshotStore {
    /// Returns every stored observation.
    fn all_observations(&self) -> Result<Vec<Observation>>;

    /// Returns observations with `observed_at >= since`.
    ///
    /// Functionally equivalent to filtering [`Self::all_observations`];
    /// implementations may use it to skip data they know is older.
    fn observations_since(&self, since: DateTime<Utc>) -> Result<Vec<Observation>> {
        Ok(self
            .all_observations()?
            .into_iter()
            .filter(|o| o.observed_at >= since)
            .collect())
    }
}

/// Write access to the station observation log.
pub trait SnapshotSink {
    /// Appends one polled batch. Stored rows are never rewritten.
    fn append(&mut self, batch: &[Observation]) -> Result<()>;
}
