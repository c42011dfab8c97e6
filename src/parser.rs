//! Parser for CityBikes network documents.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::observation::Observation;

#[derive(Debug, Deserialize)]
struct NetworkResponse {
    network: Network,
}

#[derive(Debug, Deserialize)]
struct Network {
    #[serde(default)]
    stations: Vec<StationPayload>,
}

/// A station as published by the feed. Counts are optional there: stations
/// under maintenance may report `null`.
#[derive(Debug, Deserialize)]
struct StationPayload {
    id: String,
    name: String,
    free_bikes: Option<u32>,
    empty_slots: Option<u32>,
    latitude: f64,
    longitude: f64,
}

/// Decodes a `/v2/networks/{id}` JSON document into observations.
///
/// Every observation of one poll carries the same `observed_at`. Stations
/// without `free_bikes` or `empty_slots` are skipped.
///
/// # Errors
///
/// Returns an error if the bytes are not a network document.
pub fn parse_network(bytes: &[u8], observed_at: DateTime<Utc>) -> Result<Vec<Observation>> {
    let response: NetworkResponse =
        serde_json::from_slice(bytes).context("Failed to decode network document")?;

    let mut observations = Vec::with_capacity(response.network.stations.len());
    for st in response.network.stations {
        let (Some(free_bikes), Some(empty_slots)) = (st.free_bikes, st.empty_slots) else {
            warn!(station_id = %st.id, "Station without bike counts, skipping");
            continue;
        };
        observations.push(Observation {
            station_id: st.id,
            name: st.name,
            free_bikes,
            empty_slots,
            latitude: st.latitude,
            longitude: st.longitude,
            observed_at,
        });
    }

    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_minimal_network() {
        let body = br#"{"network": {"id": "v3-bordeaux", "stations": [
            {"id": "abc", "name": "Gambetta", "free_bikes": 4, "empty_slots": 12,
             "latitude": 44.84, "longitude": -0.58, "timestamp": "2025-03-14T07:59:41Z"}
        ]}}"#;

        let parsed = parse_network(body, now()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].station_id, "abc");
        assert_eq!(parsed[0].free_bikes, 4);
        assert_eq!(parsed[0].empty_slots, 12);
        assert_eq!(parsed[0].observed_at, now());
    }

    #[test]
    fn test_stations_without_counts_are_skipped() {
        let body = br#"{"network": {"stations": [
            {"id": "a", "name": "A", "free_bikes": null, "empty_slots": 3, "latitude": 0.0, "longitude": 0.0},
            {"id": "b", "name": "B", "free_bikes": 1, "empty_slots": 3, "latitude": 0.0, "longitude": 0.0}
        ]}}"#;

        let parsed = parse_network(body, now()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].station_id, "b");
    }

    #[test]
    fn test_parse_invalid_bytes() {
        assert!(parse_network(b"not json", now()).is_err());
        assert!(parse_network(br#"{"stations": []}"#, now()).is_err());
    }
}
