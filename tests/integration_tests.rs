use bikeshare_pulse::analyzers::anomaly::{AnomalyConfig, detect_static_bikes};
use bikeshare_pulse::analyzers::cluster::{KMeans, SpatialClusterer};
use bikeshare_pulse::analyzers::report::{ReportConfig, build_report, report_from_store};
use bikeshare_pulse::observation::Observation;
use bikeshare_pulse::parser::parse_network;
use bikeshare_pulse::store::{CsvSnapshotStore, SnapshotSink, SnapshotStore};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use std::fs;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 8, 0, 0).unwrap()
}

/// Five polls, five minutes apart. Meriadeck gains a bike each poll; every
/// other station stays put.
fn polled_history() -> Vec<Observation> {
    let bytes = include_bytes!("fixtures/citybikes_network.json");
    let mut history = Vec::new();
    for round in 0..5 {
        let at = start() + TimeDelta::minutes(5 * round);
        let mut batch = parse_network(bytes, at).expect("Failed to parse fixture");
        for o in batch.iter_mut().filter(|o| o.name == "Meriadeck") {
            o.free_bikes += round as u32;
            o.empty_slots -= round as u32;
        }
        history.extend(batch);
    }
    history
}

#[test]
fn test_fixture_parses_stations_with_counts() {
    let bytes = include_bytes!("fixtures/citybikes_network.json");
    let parsed = parse_network(bytes, start()).expect("Failed to parse fixture");
    assert_eq!(parsed.len(), 5);
    assert!(parsed.iter().all(|o| o.observed_at == start()));
}

#[test]
fn test_full_pipeline_through_csv_store() {
    let dir = std::env::temp_dir().join(format!("bikeshare_pulse_it_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    let mut store = CsvSnapshotStore::new(&dir, "v3-bordeaux");

    let history = polled_history();
    for batch in history.chunks(5) {
        store.append(batch).expect("Failed to append");
    }
    assert_eq!(store.all_observations().unwrap().len(), 25);

    let now = start() + TimeDelta::minutes(20);
    let config = ReportConfig {
        window_hours: Some(1),
        anomaly: AnomalyConfig {
            window_minutes: 15,
            activity_threshold: 4,
            static_threshold: 0.0,
        },
        ..ReportConfig::default()
    };
    let report = report_from_store(&store, &config, &KMeans::with_seed(11), now).unwrap();

    assert_eq!(report.station_count, 5);
    assert_eq!(report.capacity.total_bikes, 11 + 0 + 18 + 2 + 0);
    assert_eq!(report.capacity.total_capacity, 20 + 20 + 20 + 30);
    assert!((0.0..=1.0).contains(&report.capacity.utilization));

    assert_eq!(report.most_active.name.as_deref(), Some("Meriadeck"));
    assert_eq!(report.most_active.movement, 4.0);
    assert_eq!(report.movement_ranking[0].station_id, "0a1f");

    // Quinconces holds 2 bikes; Hotel de Ville and Bassins a Flot are empty.
    assert_eq!(report.critical_count, 3);

    let flagged: Vec<&str> = report
        .anomalies
        .as_ref()
        .expect("history is not empty")
        .iter()
        .map(|a| a.station_id.as_str())
        .collect();
    assert_eq!(flagged, vec!["1b2e", "2c3d", "3d4c", "4e5b"]);

    assert_eq!(report.clusters.centers.len(), 5);
    assert_eq!(report.clusters.assignments.len(), 5);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_report_is_idempotent() {
    let history = polled_history();
    let now = start() + TimeDelta::minutes(20);
    let config = ReportConfig::default();

    let first = build_report(&history, &config, &KMeans::with_seed(5), now);
    let second = build_report(&history, &config, &KMeans::with_seed(5), now);
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}

#[test]
fn test_static_detection_and_clusters_on_empty_input() {
    assert!(detect_static_bikes(&[], &AnomalyConfig::default()).is_empty());
    let result = KMeans::default().cluster(&[], 3);
    assert!(result.assignments.is_empty());
    assert!(result.centers.is_empty());
}
