use anyhow::{Context, Result};
use async_trait::async_trait;
use bikeshare_pulse::fetch::{HttpClient, fetch_bytes};
use bikeshare_pulse::observation::Observation;
use bikeshare_pulse::parser::parse_network;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::services::network_api::NetworkApi;

/// Reads station status from the CityBikes v2 API.
pub struct CityBikesClient<C> {
    client: C,
    base_url: String,
    network_id: String,
}

impl<C: HttpClient> CityBikesClient<C> {
    pub fn new(client: C, base_url: &str, network_id: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            network_id: network_id.to_string(),
        }
    }

    pub fn network_url(&self) -> String {
        format!("{}/v2/networks/{}", self.base_url, self.network_id)
    }
}

#[async_trait]
impl<C: HttpClient> NetworkApi for CityBikesClient<C> {
    async fn fetch_stations(&self, observed_at: DateTime<Utc>) -> Result<Vec<Observation>> {
        let url = self.network_url();
        let bytes = fetch_bytes(&self.client, &url)
            .await
            .with_context(|| format!("Failed to fetch {url}"))?;
        debug!(bytes = bytes.len(), "Network document received, parsing");

        parse_network(&bytes, observed_at)
    }
}
