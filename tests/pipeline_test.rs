//! End-to-end runs of the export coordinator against a scripted store
//!
//! The flood provider issues its real queries; the scripted client answers the
//! ones that matter and returns empty tables for the rest.

mod common;

use common::{file_list, table, text_table, write_archive, Script, ScriptedConnector};
use lossport::adapters::results::ProviderRegistry;
use lossport::core::export::{ExportCoordinator, RunFailureKind};
use lossport::domain::{LossportError, Value};
use std::path::Path;
use tempfile::TempDir;
use tokio::sync::watch;

const FLOOD_COMMENT: &str = "31ed16|202020|Region|Region.bk|0|1|0|0";
const BLOCK_A: &str = "290950001001000";
const BLOCK_B: &str = "290950001001001";

fn flood_script() -> Script {
    Script::new()
        .rows("FILELISTONLY", file_list())
        .rows("AS scenarios", text_table(&["scenarios"], &[&["Riverine"]]))
        .rows(
            "AS returnPeriod",
            table(&["returnPeriod"], vec![vec![Value::Float(29.0)]]),
        )
        .rows(
            "AS EconLoss",
            table(
                &["block", "EconLoss"],
                vec![
                    vec![Value::from(BLOCK_A), Value::Float(1500.0)],
                    vec![Value::from(BLOCK_B), Value::Float(250.0)],
                ],
            ),
        )
        .rows(
            "hzCensusBlock",
            text_table(
                &["block", "geometry"],
                &[
                    &[BLOCK_A, "POLYGON ((-94.5 39.1, -94.4 39.1, -94.4 39.2, -94.5 39.1))"],
                    &[BLOCK_B, "POLYGON ((-94.4 39.1, -94.3 39.1, -94.3 39.2, -94.4 39.1))"],
                ],
            ),
        )
        .rows(
            "AS Occupancy",
            table(
                &["Occupancy", "TotalLoss"],
                vec![vec![Value::from("RES1"), Value::Float(1750.0)]],
            ),
        )
}

fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    (headers, rows)
}

fn column(headers: &[String], name: &str) -> usize {
    headers.iter().position(|h| h == name).unwrap()
}

#[tokio::test]
async fn test_flood_package_end_to_end() {
    let dir = TempDir::new().unwrap();
    let archive = write_archive(dir.path(), "Region.hpr", FLOOD_COMMENT, &[("Region.bk", b"bk")]);
    let output = dir.path().join("out");
    let config = common::config(&archive, &output);

    let connector = ScriptedConnector::new(flood_script());
    let statements = connector.log.clone();
    let (_tx, rx) = watch::channel(false);
    let coordinator = ExportCoordinator::with_backends(
        config,
        Box::new(connector),
        ProviderRegistry::hazus(),
        rx,
    );

    let summary = coordinator.execute_export().await.unwrap();

    // One combination, every kind attempted
    assert_eq!(summary.hazards, 1);
    assert_eq!(summary.combinations, 1);
    assert_eq!(summary.completed_combinations, 1);
    assert_eq!(summary.unsupported_kinds, 1); // flood casualties
    assert!(!summary.interrupted);

    let package_dir = output.join("Region");
    let stage = package_dir.join("flood").join("Riverine").join("STAGE_29");
    assert!(stage.is_dir());
    for file in [
        "results.csv",
        "results.shp",
        "results.shx",
        "results.dbf",
        "results.prj",
        "results.geojson",
        "building_damage_by_occupancy.csv",
        "building_damage_by_type.csv",
        "damaged_facilities.csv",
    ] {
        assert!(stage.join(file).is_file(), "missing {file}");
    }
    assert!(!stage.join("casualties.csv").exists());

    // No facilities in this store, so their spatial exports fail and are recorded
    assert!(!stage.join("damaged_facilities.shp").exists());
    assert_eq!(summary.failure_count(RunFailureKind::Export), 2);
    assert_eq!(summary.failures.len(), 2);

    let (headers, rows) = read_csv(&stage.join("results.csv"));
    assert_eq!(headers, vec!["block", "EconLoss"]);
    assert_eq!(rows.len(), 2);

    // Catalog: one event, one analysis, downloads referencing it
    let (event_headers, events) = read_csv(&package_dir.join("Event.csv"));
    assert_eq!(events.len(), 1);
    // Events are named after the package, not the restored database
    assert_eq!(events[0][column(&event_headers, "name")], "Region");

    let (analysis_headers, analyses) = read_csv(&package_dir.join("Analysis.csv"));
    assert_eq!(analyses.len(), 1);
    let analysis = &analyses[0];
    assert_eq!(analysis[column(&analysis_headers, "name")], "Riverine");
    assert_eq!(analysis[column(&analysis_headers, "hazard")], "flood");
    assert_eq!(
        analysis[column(&analysis_headers, "eventId")],
        events[0][column(&event_headers, "id")]
    );
    assert_eq!(
        analysis[column(&analysis_headers, "meta")],
        r#"{"HazusVersion":"Hazus 4.2.3"}"#
    );

    let (download_headers, downloads) = read_csv(&package_dir.join("Download.csv"));
    assert_eq!(downloads.len(), summary.artifacts_written);
    assert_eq!(downloads.len(), 6);
    let analysis_id = &analysis[column(&analysis_headers, "id")];
    for row in &downloads {
        assert_eq!(&row[column(&download_headers, "analysisId")], analysis_id);
        assert_eq!(row[column(&download_headers, "category")], "29");
        assert_eq!(row[column(&download_headers, "subcategory")], "Results");
        assert!(row[column(&download_headers, "file")].starts_with("flood/Riverine/STAGE_29/"));
        assert!(!row[column(&download_headers, "dateUpdate")].is_empty());
    }
    let shp = downloads
        .iter()
        .find(|r| r[column(&download_headers, "name")] == "results.shp")
        .unwrap();
    assert_eq!(shp[column(&download_headers, "icon")], "spatial");

    // Teardown ran
    assert!(!output.join("Region_temp").exists());
    let statements = statements.lock().unwrap();
    assert!(statements
        .last()
        .unwrap()
        .contains("DROP DATABASE [bk_Region]"));
}

#[tokio::test]
async fn test_keep_flags_skip_teardown() {
    let dir = TempDir::new().unwrap();
    let archive = write_archive(dir.path(), "Region.hpr", FLOOD_COMMENT, &[("Region.bk", b"bk")]);
    let output = dir.path().join("out");
    let mut config = common::config(&archive, &output);
    config.cleanup.drop_store = false;
    config.cleanup.delete_working_dir = false;

    let connector = ScriptedConnector::new(flood_script());
    let statements = connector.log.clone();
    let (_tx, rx) = watch::channel(false);
    let coordinator = ExportCoordinator::with_backends(
        config,
        Box::new(connector),
        ProviderRegistry::hazus(),
        rx,
    );

    coordinator.execute_export().await.unwrap();

    assert!(output.join("Region_temp").join("Region.bk").is_file());
    assert!(!statements
        .lock()
        .unwrap()
        .iter()
        .any(|s| s.contains("DROP DATABASE")));
}

#[tokio::test]
async fn test_archive_without_image_is_fatal_and_cleans_up() {
    let dir = TempDir::new().unwrap();
    let archive = write_archive(
        dir.path(),
        "Region.hpr",
        FLOOD_COMMENT,
        &[("readme.txt", b"no backup here")],
    );
    let output = dir.path().join("out");
    let config = common::config(&archive, &output);

    let connector = ScriptedConnector::new(flood_script());
    let statements = connector.log.clone();
    let (_tx, rx) = watch::channel(false);
    let coordinator = ExportCoordinator::with_backends(
        config,
        Box::new(connector),
        ProviderRegistry::hazus(),
        rx,
    );

    let err = coordinator.execute_export().await.unwrap_err();

    assert!(matches!(err, LossportError::NoBackingImage(_)));
    assert!(!output.join("Region_temp").exists());
    assert!(statements.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_store_is_fatal() {
    let dir = TempDir::new().unwrap();
    let archive = write_archive(dir.path(), "Region.hpr", FLOOD_COMMENT, &[("Region.bk", b"bk")]);
    let output = dir.path().join("out");
    let config = common::config(&archive, &output);

    let connector = ScriptedConnector::new(flood_script())
        .with_down("primary")
        .with_down("fallback");
    let (_tx, rx) = watch::channel(false);
    let coordinator = ExportCoordinator::with_backends(
        config,
        Box::new(connector),
        ProviderRegistry::hazus(),
        rx,
    );

    let err = coordinator.execute_export().await.unwrap_err();
    assert!(matches!(err, LossportError::ConnectionUnavailable(_)));
}

#[tokio::test]
async fn test_missing_archive_path_is_config_error() {
    let dir = TempDir::new().unwrap();
    let mut config = common::config(&dir.path().join("Region.hpr"), dir.path());
    config.archive.path = None;

    let (_tx, rx) = watch::channel(false);
    let coordinator = ExportCoordinator::with_backends(
        config,
        Box::new(ScriptedConnector::new(Script::new())),
        ProviderRegistry::hazus(),
        rx,
    );

    let err = coordinator.execute_export().await.unwrap_err();
    assert!(matches!(err, LossportError::Configuration(_)));
}

#[tokio::test]
async fn test_scenario_filter_narrows_run() {
    let dir = TempDir::new().unwrap();
    let archive = write_archive(dir.path(), "Region.hpr", FLOOD_COMMENT, &[("Region.bk", b"bk")]);
    let output = dir.path().join("out");
    let mut config = common::config(&archive, &output);
    config.export.scenarios = vec!["Coastal".to_string()];

    let (_tx, rx) = watch::channel(false);
    let coordinator = ExportCoordinator::with_backends(
        config,
        Box::new(ScriptedConnector::new(flood_script())),
        ProviderRegistry::hazus(),
        rx,
    );

    let summary = coordinator.execute_export().await.unwrap();

    assert_eq!(summary.combinations, 0);
    assert!(!output.join("Region").join("flood").join("Riverine").exists());
    // The catalog is still written, with the hazard's event only
    let (_, events) = read_csv(&output.join("Region").join("Event.csv"));
    assert_eq!(events.len(), 1);
    let (_, analyses) = read_csv(&output.join("Region").join("Analysis.csv"));
    assert!(analyses.is_empty());
}
