//! CLI entry point for bikeshare_pulse.
//!
//! Provides subcommands for polling a bike-share network into the local
//! store, building the analytics report, inspecting one station and ranking
//! stations by activity.

mod infra;
mod services;

use crate::infra::citybikes::client::CityBikesClient;
use crate::services::network_api::NetworkApi;
use anyhow::Result;
use bikeshare_pulse::analyzers::anomaly::AnomalyConfig;
use bikeshare_pulse::analyzers::cluster::{DEFAULT_CLUSTERS, KMeans};
use bikeshare_pulse::analyzers::movement::station_movements;
use bikeshare_pulse::analyzers::report::{ReportConfig, report_from_store};
use bikeshare_pulse::analyzers::capacity::snapshot_table;
use bikeshare_pulse::analyzers::snapshot::latest_snapshot;
use bikeshare_pulse::analyzers::station::{search_stations, station_history};
use bikeshare_pulse::analyzers::window::filter_by_hours;
use bikeshare_pulse::{
    config::Settings,
    fetch::BasicClient,
    output::{print_json, write_json},
    store::{CsvSnapshotStore, SnapshotSink, SnapshotStore},
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Fetches slower than this are logged as a warning.
const SLOW_FETCH_SECS: u64 = 5;

#[derive(Parser)]
#[command(name = "bikeshare_pulse")]
#[command(about = "Bike-share station telemetry and analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the network and append station observations to the store
    Poll {
        /// Seconds between polls (defaults to POLL_INTERVAL)
        #[arg(short = 'r', long)]
        interval: Option<u64>,

        /// Number of polls (0 = infinite)
        #[arg(short = 'n', long, default_value_t = 0)]
        num_samples: usize,
    },
    /// Build the analytics report from the store
    Report {
        /// Trailing history window in hours (all data when omitted)
        #[arg(short = 'w', long)]
        window_hours: Option<u32>,

        /// Number of stations in rankings and tables
        #[arg(short = 't', long, default_value_t = 10)]
        top_n: usize,

        /// Stations with at most this many free bikes are critical
        #[arg(short = 'c', long, default_value_t = 3)]
        critical_threshold: u32,

        /// Requested cluster count for the station map
        #[arg(short = 'k', long, default_value_t = DEFAULT_CLUSTERS)]
        clusters: usize,

        /// Stuck-bike detection horizon in minutes
        #[arg(long, default_value_t = 15)]
        anomaly_window_minutes: u32,

        /// Minimum recent samples for a station to count as active
        #[arg(long, default_value_t = 5)]
        activity_threshold: usize,

        /// Maximum movement for an active station to count as stuck
        #[arg(long, default_value_t = 1.0)]
        static_threshold: f64,

        /// JSON file to write the report to (logged when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the history of one station
    Station {
        /// Station identifier, or part of its name
        #[arg(value_name = "STATION")]
        query: String,

        /// Trailing history window in hours (all data when omitted)
        #[arg(short = 'w', long)]
        window_hours: Option<u32>,

        /// Stations with at most this many free bikes are critical
        #[arg(short = 'c', long, default_value_t = 3)]
        critical_threshold: u32,
    },
    /// Rank stations by total movement over all stored data
    Rank {
        /// Number of stations to show
        #[arg(short = 't', long, default_value_t = 10)]
        top_n: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/bikeshare_pulse.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bikeshare_pulse.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    let mut store = CsvSnapshotStore::new(&settings.data_dir, &settings.network_id);

    match cli.command {
        Commands::Poll {
            interval,
            num_samples,
        } => {
            let interval = interval.unwrap_or(settings.poll_interval_secs);
            let api = CityBikesClient::new(
                BasicClient::new()?,
                &settings.base_url,
                &settings.network_id,
            );
            poll(&api, &mut store, interval, num_samples).await;
        }
        Commands::Report {
            window_hours,
            top_n,
            critical_threshold,
            clusters,
            anomaly_window_minutes,
            activity_threshold,
            static_threshold,
            output,
        } => {
            let config = ReportConfig {
                window_hours,
                top_n,
                critical_threshold,
                clusters,
                anomaly: AnomalyConfig {
                    window_minutes: anomaly_window_minutes,
                    activity_threshold,
                    static_threshold,
                },
                ..ReportConfig::default()
            };
            let report = report_from_store(&store, &config, &KMeans::default(), Utc::now())?;

            match output {
                Some(path) => {
                    write_json(&path, &report)?;
                    info!(path = %path.display(), "Report written");
                }
                None => print_json(&report)?,
            }
        }
        Commands::Station {
            query,
            window_hours,
            critical_threshold,
        } => {
            let all = store.all_observations()?;
            let snapshot = snapshot_table(&latest_snapshot(&all));
            let station_id = if snapshot.iter().any(|row| row.station_id == query) {
                query
            } else {
                match search_stations(&snapshot, &query).as_slice() {
                    [row] => row.station_id.clone(),
                    [] => {
                        warn!(query = %query, "No station matches");
                        return Ok(());
                    }
                    candidates => {
                        for row in candidates {
                            info!(station_id = %row.station_id, name = %row.name, "Candidate");
                        }
                        warn!(query = %query, matches = candidates.len(), "Query is ambiguous");
                        return Ok(());
                    }
                }
            };

            let observations = filter_by_hours(&all, window_hours);
            let anomaly = AnomalyConfig::default();
            match station_history(&observations, &station_id, critical_threshold, &anomaly) {
                Some(history) => print_json(&history)?,
                None => warn!(station_id = %station_id, "No observations for station in window"),
            }
        }
        Commands::Rank { top_n } => {
            let observations = store.all_observations()?;
            let ranking = station_movements(&observations);

            for (rank, record) in ranking.iter().take(top_n).enumerate() {
                info!(
                    rank = rank + 1,
                    station_id = %record.station_id,
                    name = %record.name,
                    movement = record.total_movement,
                    "Station"
                );
            }

            info!(
                stations = ranking.len(),
                rows = observations.len(),
                "Ranking summary"
            );
        }
    }

    Ok(())
}

/// Polls the network every `interval` seconds and appends each batch to the
/// store. Fetch, parse and store errors are logged and the loop carries on.
/// Returns the number of batches stored.
#[tracing::instrument(skip(api, store))]
async fn poll(
    api: &impl NetworkApi,
    store: &mut impl SnapshotSink,
    interval: u64,
    num_samples: usize,
) -> usize {
    if num_samples == 0 {
        info!(interval, "Polling infinitely. Press Ctrl+C to stop.");
    } else {
        info!(num_samples, interval, "Starting poll rounds");
    }

    let mut sample_count = 0;
    let mut stored = 0;

    loop {
        // Check if we've reached the sample limit (0 = infinite)
        if num_samples > 0 && sample_count >= num_samples {
            break;
        }
        sample_count += 1;

        let fetch_start = Instant::now();
        match api.fetch_stations(Utc::now()).await {
            Ok(batch) => {
                let elapsed = fetch_start.elapsed();
                if is_slow_fetch(elapsed) {
                    warn!(elapsed_secs = elapsed.as_secs_f64(), "Network fetch was slow");
                }
                match store.append(&batch) {
                    Ok(()) => {
                        stored += 1;
                        info!(sample = sample_count, stations = batch.len(), "Observations stored");
                    }
                    Err(e) => {
                        error!(sample = sample_count, error = %e, "Failed to store observations");
                    }
                }
            }
            Err(e) => {
                error!(sample = sample_count, error = %e, "Network fetch failed");
            }
        }

        // If not the last sample, wait before next iteration
        if num_samples == 0 || sample_count < num_samples {
            info!(interval, "Waiting before next poll");
            tokio::time::sleep(Duration::from_secs(interval)).await;
        }
    }

    info!(sample_count, stored, "Finished polling");
    stored
}

fn is_slow_fetch(elapsed: Duration) -> bool {
    elapsed > Duration::from_secs(SLOW_FETCH_SECS)
}
