//! Runtime settings read from the environment (and `.env`, loaded by the binary).

use anyhow::{Context, Result};
use std::str::FromStr;

pub const DEFAULT_BASE_URL: &str = "https://api.citybik.es";
pub const DEFAULT_NETWORK_ID: &str = "v3-bordeaux";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_DATA_DIR: &str = "data";

/// Poller and store settings.
///
/// | Variable             | Default                  |
/// |----------------------|--------------------------|
/// | `CITYBIKES_BASE_URL` | `https://api.citybik.es` |
/// | `NETWORK_ID`         | `v3-bordeaux`            |
/// | `POLL_INTERVAL`      | `300` (seconds)          |
/// | `DATA_DIR`           | `data`                   |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub network_id: String,
    pub poll_interval_secs: u64,
    pub data_dir: String,
}

impl Settings {
    /// Reads settings from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            base_url: lookup("CITYBIKES_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            network_id: lookup("NETWORK_ID").unwrap_or_else(|| DEFAULT_NETWORK_ID.to_string()),
            poll_interval_secs: parse_var(&lookup, "POLL_INTERVAL", DEFAULT_POLL_INTERVAL_SECS)?,
            data_dir: lookup("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.network_id, DEFAULT_NETWORK_ID);
        assert_eq!(settings.poll_interval_secs, 300);
        assert_eq!(settings.data_dir, "data");
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("NETWORK_ID", "velib"),
            ("POLL_INTERVAL", " 60 "),
            ("DATA_DIR", "/tmp/bikes"),
        ]))
        .unwrap();
        assert_eq!(settings.network_id, "velib");
        assert_eq!(settings.poll_interval_secs, 60);
        assert_eq!(settings.data_dir, "/tmp/bikes");
    }

    #[test]
    fn test_invalid_interval() {
        let err = Settings::from_lookup(lookup_from(&[("POLL_INTERVAL", "soon")])).unwrap_err();
        assert!(err.to_string().contains("POLL_INTERVAL"));
    }
}
