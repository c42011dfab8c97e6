use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use csv::WriterBuilder;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{SnapshotSink, SnapshotStore};
use crate::observation::Observation;

/// A [`SnapshotStore`] over a directory of daily CSV files.
///
/// Layout: `{base_dir}/network_id={network_id}/date=YYYY-MM-DD.csv`, one row
/// per observation. Files are only ever appended to.
#[derive(Debug, Clone)]
pub struct CsvSnapshotStore {
    base_dir: PathBuf,
    network_id: String,
}

impl CsvSnapshotStore {
    pub fn new(base_dir: impl Into<PathBuf>, network_id: &str) -> Self {
        Self {
            base_dir: base_dir.into(),
            network_id: network_id.to_string(),
        }
    }

    /// Directory holding this network's day files.
    pub fn network_dir(&self) -> PathBuf {
        self.base_dir.join(format!("network_id={}", self.network_id))
    }

    fn day_file(&self, date: NaiveDate) -> PathBuf {
        self.network_dir()
            .join(format!("date={}.csv", date.format("%Y-%m-%d")))
    }

    /// Lists `(date, path)` for every day file, oldest first.
    fn day_files(&self) -> Result<Vec<(NaiveDate, PathBuf)>> {
        let dir = self.network_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(date) = file_name
                .to_str()
                .and_then(|n| n.strip_prefix("date="))
                .and_then(|n| n.strip_suffix(".csv"))
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            else {
                continue;
            };
            files.push((date, entry.path()));
        }
        files.sort_by_key(|(date, _)| *date);

        Ok(files)
    }
}

fn append_rows(path: &Path, rows: &[&Observation]) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, rows = rows.len(), "Appending observations");

    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

fn read_rows(path: &Path) -> Result<Vec<Observation>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(file);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: Observation =
            result.with_context(|| format!("Malformed observation row in {}", path.display()))?;
        rows.push(record);
    }

    Ok(rows)
}

impl SnapshotStore for CsvSnapshotStore {
    #[tracing::instrument(skip(self), fields(network_id = %self.network_id))]
    fn all_observations(&self) -> Result<Vec<Observation>> {
        let mut rows = Vec::new();
        for (_, path) in self.day_files()? {
            rows.extend(read_rows(&path)?);
        }
        debug!(rows = rows.len(), "Loaded observations");
        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(network_id = %self.network_id, since = %since))]
    fn observations_since(&self, since: DateTime<Utc>) -> Result<Vec<Observation>> {
        let since_day = since.date_naive();
        let mut rows = Vec::new();
        for (date, path) in self.day_files()? {
            if date < since_day {
                continue;
            }
            rows.extend(
                read_rows(&path)?
                    .into_iter()
                    .filter(|o| o.observed_at >= since),
            );
        }
        debug!(rows = rows.len(), "Loaded observations");
        Ok(rows)
    }
}

impl SnapshotSink for CsvSnapshotStore {
    /// Appends a batch of observations, routing each to the file of its UTC day.
    ///
    /// Creates the directory and the file (with headers) when missing.
    #[tracing::instrument(
        skip(self, batch),
        fields(network_id = %self.network_id, rows = batch.len())
    )]
    fn append(&mut self, batch: &[Observation]) -> Result<()> {
        let dir = self.network_dir();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create store directory {}", dir.display()))?;

        let mut by_day: BTreeMap<NaiveDate, Vec<&Observation>> = BTreeMap::new();
        for o in batch {
            by_day.entry(o.observed_at.date_naive()).or_default().push(o);
        }

        for (date, rows) in by_day {
            let path = self.day_file(date);
            append_rows(&path, &rows)?;
        }

        Ok(())
    }
}
