//! Output of reports and rankings.
//!
//! Supports logging as pretty JSON and writing JSON files.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes a value as pretty-printed JSON to `path`, creating parent directories.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let body = serde_json::to_vec_pretty(value)?;
    debug!(path = %path.display(), bytes = body.len(), "Writing JSON");
    fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::CapacityMetrics;
    use std::env;

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&CapacityMetrics::default()).unwrap();
    }

    #[test]
    fn test_write_json_creates_parent() {
        let dir = env::temp_dir().join(format!("bikeshare_pulse_out_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("capacity.json");

        write_json(&path, &CapacityMetrics::default()).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["total_capacity"], 0);
        assert_eq!(value["utilization"], 0.0);

        fs::remove_dir_all(&dir).unwrap();
    }
}
