//! Trait for bike-share network providers.

use anyhow::Result;
use bikeshare_pulse::observation::Observation;
use chrono::{DateTime, Utc};

/// Abstraction over a source of live station status (e.g., CityBikes).
#[async_trait::async_trait]
pub trait NetworkApi {
    /// Fetches the current status of every station, stamped with `observed_at`.
    async fn fetch_stations(&self, observed_at: DateTime<Utc>) -> Result<Vec<Observation>>;
}
