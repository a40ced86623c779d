//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables should be run with --test-threads=1
//! to avoid interference between tests.

use lossport::config::load_config;
use lossport::domain::{Hazard, OutputFormat, ResultKind};
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    std::env::remove_var("LOSSPORT_APPLICATION_LOG_LEVEL");
    std::env::remove_var("LOSSPORT_ARCHIVE_PATH");
    std::env::remove_var("LOSSPORT_STORE_ENDPOINTS");
    std::env::remove_var("LOSSPORT_EXPORT_FORMATS");
    std::env::remove_var("LOSSPORT_EXPORT_HAZARDS");
    std::env::remove_var("LOSSPORT_EXPORT_RESULT_KINDS");
    std::env::remove_var("LOSSPORT_CLEANUP_DROP_STORE");
    std::env::remove_var("TEST_HAZUS_SA_PASSWORD");
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(contents.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    let toml_content = r#"
[application]
log_level = "debug"

[archive]
path = "/data/FIMJacksonMO.hpr"
output_dir = "/data/exports"

[store]
endpoints = ["hazus01\\HAZUSPLUSSRVR", "hazus02,1433"]
username = "hazus_export"
password = "test_pass"
trust_server_certificate = false
connect_timeout_seconds = 5
query_timeout_seconds = 900
restore_timeout_seconds = 7200

[export]
formats = ["csv", "geojson"]
result_kinds = ["results", "damaged_facilities"]
hazards = ["flood"]
scenarios = ["Riverine"]
return_period_label = "RP"
combination_timeout_seconds = 600

[catalog]
analysis_type = "Deterministic"
source = "Hazus"
modified_inventory = "No"

[cleanup]
drop_store = false
delete_working_dir = true

[logging]
local_enabled = false
local_path = "/tmp/lossport"
local_rotation = "hourly"
"#;

    let temp_file = write_config(toml_content);
    let config = load_config(temp_file.path()).expect("Failed to load config");

    // Application and archive
    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.archive.path.as_deref(), Some("/data/FIMJacksonMO.hpr"));
    assert_eq!(config.archive.output_dir, "/data/exports");

    // Store
    assert_eq!(
        config.store.endpoints,
        vec!["hazus01\\HAZUSPLUSSRVR", "hazus02,1433"]
    );
    assert_eq!(config.store.username, "hazus_export");
    assert_eq!(config.store.password.expose_secret(), "test_pass");
    assert!(!config.store.trust_server_certificate);
    assert_eq!(config.store.connect_timeout_seconds, 5);
    assert_eq!(config.store.query_timeout_seconds, 900);
    assert_eq!(config.store.restore_timeout_seconds, 7200);

    // Export
    assert_eq!(
        config.export.formats,
        vec![OutputFormat::Csv, OutputFormat::GeoJson]
    );
    assert_eq!(
        config.export.result_kinds,
        vec![ResultKind::Results, ResultKind::DamagedFacilities]
    );
    assert_eq!(config.export.hazards, vec![Hazard::Flood]);
    assert_eq!(config.export.scenarios, vec!["Riverine"]);
    assert_eq!(config.export.return_period_label, "RP");
    assert_eq!(config.export.combination_timeout_seconds, 600);

    // Catalog and cleanup
    assert_eq!(config.catalog.analysis_type, "Deterministic");
    assert_eq!(config.catalog.source, "Hazus");
    assert_eq!(config.catalog.modified_inventory, "No");
    assert!(!config.cleanup.drop_store);
    assert!(config.cleanup.delete_working_dir);

    // Logging
    assert!(!config.logging.local_enabled);
    assert_eq!(config.logging.local_path, "/tmp/lossport");
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_load_minimal_config_with_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let toml_content = r#"
[store]
password = "pass"
"#;

    let temp_file = write_config(toml_content);
    let config = load_config(temp_file.path()).expect("Failed to load config");

    // Verify defaults are applied
    assert_eq!(config.application.log_level, "info");
    assert!(config.archive.path.is_none());
    assert_eq!(config.archive.output_dir, "./output");
    assert_eq!(config.store.endpoints, vec!["localhost\\HAZUSPLUSSRVR"]);
    assert_eq!(config.store.username, "SA");
    assert!(config.store.trust_server_certificate);
    // Restores wait for the server unless limited
    assert_eq!(config.store.restore_timeout_seconds, 0);
    assert_eq!(config.export.formats, OutputFormat::ALL.to_vec());
    assert_eq!(config.export.result_kinds, ResultKind::ALL.to_vec());
    assert!(config.export.hazards.is_empty());
    assert_eq!(config.export.return_period_label, "STAGE");
    assert_eq!(config.export.combination_timeout_seconds, 1800);
    assert!(config.catalog.analysis_type.is_empty());
    assert!(config.cleanup.drop_store);
    assert!(config.cleanup.delete_working_dir);
    assert!(config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "daily");
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_HAZUS_SA_PASSWORD", "Gohazusplus_02");

    let toml_content = r#"
[store]
password = "${TEST_HAZUS_SA_PASSWORD}"
"#;

    let temp_file = write_config(toml_content);
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.store.password.expose_secret(), "Gohazusplus_02");

    std::env::remove_var("TEST_HAZUS_SA_PASSWORD");
}

#[test]
fn test_missing_substitution_variable() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let toml_content = r#"
[store]
password = "${TEST_HAZUS_SA_PASSWORD}"
"#;

    let temp_file = write_config(toml_content);
    let err = load_config(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("TEST_HAZUS_SA_PASSWORD"));
}

#[test]
fn test_env_var_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("LOSSPORT_APPLICATION_LOG_LEVEL", "trace");
    std::env::set_var("LOSSPORT_ARCHIVE_PATH", "/data/banMO.hpr");
    std::env::set_var("LOSSPORT_STORE_ENDPOINTS", "primary, fallback");
    std::env::set_var("LOSSPORT_EXPORT_HAZARDS", "hurricane,tsunami");
    std::env::set_var("LOSSPORT_CLEANUP_DROP_STORE", "false");

    let toml_content = r#"
[application]
log_level = "info"

[store]
endpoints = ["configured"]
password = "pass"

[export]
hazards = ["flood"]
"#;

    let temp_file = write_config(toml_content);
    let config = load_config(temp_file.path()).expect("Failed to load config");

    // Verify env var overrides took effect
    assert_eq!(config.application.log_level, "trace");
    assert_eq!(config.archive.path.as_deref(), Some("/data/banMO.hpr"));
    assert_eq!(config.store.endpoints, vec!["primary", "fallback"]);
    assert_eq!(
        config.export.hazards,
        vec![Hazard::Hurricane, Hazard::Tsunami]
    );
    assert!(!config.cleanup.drop_store);

    cleanup_env_vars();
}

#[test]
fn test_invalid_list_override() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("LOSSPORT_EXPORT_FORMATS", "csv,kml");

    let temp_file = write_config("[store]\npassword = \"pass\"\n");
    let err = load_config(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("LOSSPORT_EXPORT_FORMATS"));

    cleanup_env_vars();
}

#[test]
fn test_invalid_config_validation() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let toml_content = r#"
[application]
log_level = "invalid_level"

[store]
password = "pass"
"#;

    let temp_file = write_config(toml_content);
    let result = load_config(temp_file.path());
    assert!(result.is_err());
}

#[test]
fn test_empty_password_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config("[store]\npassword = \"\"\n");
    let err = load_config(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("store.password"));
}

#[test]
fn test_missing_store_section() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config("[application]\nlog_level = \"info\"\n");
    assert!(load_config(temp_file.path()).is_err());
}
