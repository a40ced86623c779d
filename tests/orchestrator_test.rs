//! Integration tests for enumeration and the per-combination export loop
//!
//! A fake provider stands in for the Hazus tables so each test controls
//! exactly which result sets exist, fail or hang.

mod common;

use async_trait::async_trait;
use common::{Script, ScriptedConnector};
use lossport::adapters::results::{ProviderRegistry, ResultProvider};
use lossport::adapters::store::{StoreConnector, StoreSession};
use lossport::config::{CatalogConfig, ExportConfig};
use lossport::core::catalog::CatalogBuilder;
use lossport::core::enumerate::enumerate;
use lossport::core::export::{ExportOrchestrator, RunFailureKind, RunSummary};
use lossport::domain::{
    Hazard, ProviderError, Result, ResultKind, ResultSet, Selection, StoreError, Table, Value,
};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;

const SQUARE: &str = "POLYGON ((-80.2 25.7, -80.1 25.7, -80.1 25.8, -80.2 25.7))";

#[derive(Clone)]
struct FakeProvider {
    hazard: Hazard,
    scenarios: Vec<(&'static str, Vec<&'static str>)>,
    unsupported: Vec<ResultKind>,
    failing: Vec<(ResultKind, &'static str)>,
    slow_period: Option<&'static str>,
    empty_results: bool,
    broken_periods: Option<&'static str>,
}

impl FakeProvider {
    fn new(hazard: Hazard) -> Self {
        Self {
            hazard,
            scenarios: Vec::new(),
            unsupported: Vec::new(),
            failing: Vec::new(),
            slow_period: None,
            empty_results: false,
            broken_periods: None,
        }
    }

    fn scenario(mut self, name: &'static str, periods: &[&'static str]) -> Self {
        self.scenarios.push((name, periods.to_vec()));
        self
    }

    fn unsupported(mut self, kind: ResultKind) -> Self {
        self.unsupported.push(kind);
        self
    }

    fn failing(mut self, kind: ResultKind, period: &'static str) -> Self {
        self.failing.push((kind, period));
        self
    }

    fn slow(mut self, period: &'static str) -> Self {
        self.slow_period = Some(period);
        self
    }

    fn empty_results(mut self) -> Self {
        self.empty_results = true;
        self
    }

    fn broken_periods(mut self, scenario: &'static str) -> Self {
        self.broken_periods = Some(scenario);
        self
    }
}

#[async_trait]
impl ResultProvider for FakeProvider {
    fn hazard(&self) -> Hazard {
        self.hazard
    }

    async fn scenarios(&self, _session: &mut StoreSession) -> Result<Vec<String>> {
        Ok(self.scenarios.iter().map(|(n, _)| n.to_string()).collect())
    }

    async fn return_periods(&self, _session: &mut StoreSession, scenario: &str) -> Result<Vec<String>> {
        if self.broken_periods == Some(scenario) {
            return Err(StoreError::QueryFailed("invalid object name".to_string()).into());
        }
        Ok(self
            .scenarios
            .iter()
            .find(|(n, _)| *n == scenario)
            .map(|(_, periods)| periods.iter().map(|p| p.to_string()).collect())
            .unwrap_or_default())
    }

    async fn result_set(
        &self,
        session: &mut StoreSession,
        selection: &Selection,
        kind: ResultKind,
    ) -> Result<ResultSet> {
        session
            .query(&format!("SELECT '{selection}' AS {kind}"))
            .await?;
        if self.slow_period == Some(selection.return_period()) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if self.unsupported.contains(&kind) {
            return Err(ProviderError::Unsupported {
                hazard: self.hazard,
                kind,
            }
            .into());
        }
        if self
            .failing
            .iter()
            .any(|(k, rp)| *k == kind && *rp == selection.return_period())
        {
            return Err(StoreError::QueryFailed("deadlock victim".to_string()).into());
        }

        let set = match kind {
            ResultKind::Results if self.empty_results => {
                ResultSet::new(kind, Table::new(["tract", "EconLoss"]))
            }
            ResultKind::Results | ResultKind::DamagedFacilities => {
                let mut table = Table::new(["id", "EconLoss", "geometry"]);
                table
                    .push_row(vec![Value::from("A1"), Value::Float(10.0), Value::from(SQUARE)])
                    .unwrap();
                ResultSet::with_geometry_column(kind, table, "geometry")
            }
            _ => {
                let mut table = Table::new(["Occupancy", "TotalLoss"]);
                table
                    .push_row(vec![Value::from("RES1"), Value::Float(5.0)])
                    .unwrap();
                ResultSet::new(kind, table)
            }
        };
        Ok(set)
    }
}

async fn session_from(connector: &ScriptedConnector) -> StoreSession {
    let client = connector.connect("primary").await.unwrap();
    StoreSession::new(client, "bk_Region")
}

async fn session() -> StoreSession {
    session_from(&ScriptedConnector::new(Script::new())).await
}

struct Run {
    summary: RunSummary,
    catalog: CatalogBuilder,
    connector: ScriptedConnector,
}

impl Run {
    /// Serials of the clients that served queries for `selection`
    fn clients_for(&self, selection: &str) -> Vec<usize> {
        let needle = format!("SELECT '{selection}'");
        let mut serials: Vec<usize> = self
            .connector
            .by_client
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, sql)| sql.starts_with(&needle))
            .map(|(serial, _)| *serial)
            .collect();
        serials.dedup();
        serials
    }
}

async fn run_with(
    provider: FakeProvider,
    settings: &ExportConfig,
    package_dir: &Path,
    shutdown: Option<watch::Receiver<bool>>,
) -> Run {
    let hazard = provider.hazard;
    let registry = ProviderRegistry::new().with_provider(Box::new(provider));
    let connector = ScriptedConnector::new(Script::new());
    let mut session = session_from(&connector).await;
    let mut summary = RunSummary::new("Region");
    let mut catalog = CatalogBuilder::new("Region", CatalogConfig::default());

    let combinations = enumerate(&mut session, &registry, &[hazard], settings, &mut summary).await;

    let mut orchestrator = ExportOrchestrator::new(&registry, settings, package_dir, "Hazus 5.1")
        .with_reconnect(&connector);
    if let Some(rx) = shutdown {
        orchestrator = orchestrator.with_shutdown(rx);
    }
    orchestrator
        .run(&mut session, &combinations, &mut catalog, &mut summary)
        .await;

    Run {
        summary,
        catalog,
        connector,
    }
}

#[tokio::test]
async fn test_unsupported_kind_is_skipped_not_failed() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::new(Hazard::Hurricane)
        .scenario("Andrew", &["100"])
        .unsupported(ResultKind::Casualties);

    let run = run_with(provider, &ExportConfig::default(), dir.path(), None).await;

    let stage = dir.path().join("hurricane").join("Andrew").join("STAGE_100");
    assert!(!stage.join("casualties.csv").exists());
    assert!(stage.join("results.geojson").is_file());
    assert!(stage.join("damaged_facilities.shp").is_file());
    assert!(stage.join("building_damage_by_type.csv").is_file());

    assert_eq!(run.summary.unsupported_kinds, 1);
    assert!(run.summary.failures.is_empty());
    // results and facilities in three formats, two tabular kinds as CSV
    assert_eq!(run.summary.artifacts_written, 8);
    assert_eq!(run.catalog.downloads().len(), 8);
}

#[tokio::test]
async fn test_failures_do_not_stop_the_loop() {
    let dir = TempDir::new().unwrap();
    // A directory squatting on the CSV path makes that one export fail
    let blocked = dir
        .path()
        .join("flood")
        .join("Riverine")
        .join("STAGE_10")
        .join("results.csv");
    std::fs::create_dir_all(&blocked).unwrap();

    let provider = FakeProvider::new(Hazard::Flood)
        .scenario("Riverine", &["10", "100"])
        .unsupported(ResultKind::Casualties)
        .failing(ResultKind::BuildingDamageByType, "10");

    let run = run_with(provider, &ExportConfig::default(), dir.path(), None).await;

    assert_eq!(run.summary.combinations, 2);
    assert_eq!(run.summary.completed_combinations, 2);
    assert_eq!(run.summary.failure_count(RunFailureKind::Provider), 1);
    assert_eq!(run.summary.failure_count(RunFailureKind::Export), 1);

    let export_failure = run
        .summary
        .failures
        .iter()
        .find(|f| f.kind == RunFailureKind::Export)
        .unwrap();
    assert_eq!(
        export_failure.context.as_deref(),
        Some("flood/Riverine/10, kind=results, format=csv")
    );

    let stage_10 = dir.path().join("flood").join("Riverine").join("STAGE_10");
    assert!(stage_10.join("results.shp").is_file());
    assert!(!stage_10.join("building_damage_by_type.csv").exists());

    let stage_100 = dir.path().join("flood").join("Riverine").join("STAGE_100");
    assert!(stage_100.join("results.csv").is_file());
    assert!(stage_100.join("building_damage_by_type.csv").is_file());

    // Failed exports never reach the catalog
    assert!(run
        .catalog
        .downloads()
        .iter()
        .all(|d| d.artifact.file != "flood/Riverine/STAGE_10/results.csv"));
    assert_eq!(run.catalog.downloads().len(), run.summary.artifacts_written);
}

#[tokio::test]
async fn test_empty_results_still_attempt_every_kind() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::new(Hazard::Earthquake)
        .scenario("Northridge", &[])
        .empty_results();

    let run = run_with(provider, &ExportConfig::default(), dir.path(), None).await;

    // No return periods enumerate as "0"
    let stage = dir.path().join("earthquake").join("Northridge").join("STAGE_0");
    assert!(stage.is_dir());
    assert_eq!(
        std::fs::read_to_string(stage.join("results.csv")).unwrap(),
        "tract,EconLoss\n"
    );
    assert!(stage.join("building_damage_by_occupancy.csv").is_file());
    assert!(stage.join("casualties.csv").is_file());
    assert!(stage.join("damaged_facilities.geojson").is_file());

    // Spatial exports of a set without geometry fail and are recorded
    assert!(!stage.join("results.shp").exists());
    assert!(!stage.join("results.geojson").exists());
    assert_eq!(run.summary.failure_count(RunFailureKind::Export), 2);
    assert_eq!(run.summary.completed_combinations, 1);
}

#[tokio::test]
async fn test_existing_directories_are_reused() {
    let dir = TempDir::new().unwrap();
    let stage = dir.path().join("tsunami").join("Cascadia").join("STAGE_0");
    std::fs::create_dir_all(&stage).unwrap();
    std::fs::write(stage.join("notes.txt"), "keep me").unwrap();

    let provider = FakeProvider::new(Hazard::Tsunami).scenario("Cascadia", &["0"]);
    let settings = ExportConfig {
        formats: vec![lossport::domain::OutputFormat::Csv],
        ..ExportConfig::default()
    };

    let first = run_with(provider.clone(), &settings, dir.path(), None).await;
    let second = run_with(provider, &settings, dir.path(), None).await;

    assert!(first.summary.failures.is_empty());
    assert!(second.summary.failures.is_empty());
    assert_eq!(
        std::fs::read_to_string(stage.join("notes.txt")).unwrap(),
        "keep me"
    );
    assert!(stage.join("results.csv").is_file());
}

#[tokio::test]
async fn test_shutdown_stops_before_next_combination() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::new(Hazard::Flood).scenario("Riverine", &["10", "100"]);
    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();

    let run = run_with(provider, &ExportConfig::default(), dir.path(), Some(rx)).await;

    assert!(run.summary.interrupted);
    assert_eq!(run.summary.combinations, 2);
    assert_eq!(run.summary.completed_combinations, 0);
    assert!(!dir.path().join("flood").join("Riverine").join("STAGE_10").exists());

    // What was recorded still forms a valid catalog
    assert_eq!(run.catalog.events().len(), 1);
    assert_eq!(run.catalog.analyses().len(), 1);
    assert!(run.catalog.downloads().is_empty());
    run.catalog.finalize(dir.path()).unwrap();
}

#[tokio::test]
async fn test_combination_deadline() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::new(Hazard::Hurricane)
        .scenario("Andrew", &["10", "100"])
        .slow("10");
    let settings = ExportConfig {
        combination_timeout_seconds: 1,
        ..ExportConfig::default()
    };

    let run = run_with(provider, &settings, dir.path(), None).await;

    assert_eq!(run.summary.failure_count(RunFailureKind::Timeout), 1);
    assert_eq!(run.summary.completed_combinations, 1);
    let stage_100 = dir.path().join("hurricane").join("Andrew").join("STAGE_100");
    assert!(stage_100.join("results.csv").is_file());

    // The combination after the timeout runs on a fresh connection
    assert_eq!(run.connector.connections(), 2);
    assert_eq!(run.clients_for("hurricane/Andrew/10"), vec![0]);
    assert_eq!(run.clients_for("hurricane/Andrew/100"), vec![1]);
}

#[tokio::test]
async fn test_no_reconnect_without_timeout() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::new(Hazard::Flood).scenario("Riverine", &["10", "100"]);

    let run = run_with(provider, &ExportConfig::default(), dir.path(), None).await;

    assert_eq!(run.connector.connections(), 1);
    assert_eq!(run.clients_for("flood/Riverine/100"), vec![0]);
}

#[tokio::test]
async fn test_enumeration_failure_skips_scenario() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::new(Hazard::Flood)
        .scenario("Riverine", &["10"])
        .scenario("Coastal", &["100"])
        .broken_periods("Coastal");

    let run = run_with(provider, &ExportConfig::default(), dir.path(), None).await;

    assert_eq!(run.summary.failure_count(RunFailureKind::Enumeration), 1);
    assert_eq!(run.summary.combinations, 1);
    assert_eq!(run.catalog.analyses().len(), 1);
    assert_eq!(run.catalog.analyses()[0].name, "Riverine");
    assert!(!dir.path().join("flood").join("Coastal").exists());
}

#[tokio::test]
async fn test_analysis_meta_carries_product_version() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::new(Hazard::Flood).scenario("Riverine", &["10"]);

    let run = run_with(provider, &ExportConfig::default(), dir.path(), None).await;

    let analysis = &run.catalog.analyses()[0];
    assert_eq!(analysis.meta.get("HazusVersion").map(String::as_str), Some("Hazus 5.1"));
    assert_eq!(analysis.event_id, run.catalog.events()[0].id);
    assert!(run
        .catalog
        .downloads()
        .iter()
        .all(|d| d.artifact.analysis_id == analysis.id && d.artifact.category == "10"));
}

#[tokio::test]
async fn test_missing_provider_is_recorded() {
    let dir = TempDir::new().unwrap();
    let registry = ProviderRegistry::new();
    let settings = ExportConfig::default();
    let mut session = session().await;
    let mut summary = RunSummary::new("Region");

    let combinations = enumerate(
        &mut session,
        &registry,
        &[Hazard::Earthquake],
        &settings,
        &mut summary,
    )
    .await;

    assert!(combinations.is_empty());
    assert_eq!(summary.failure_count(RunFailureKind::Enumeration), 1);

    let mut catalog = CatalogBuilder::new("Region", CatalogConfig::default());
    ExportOrchestrator::new(&registry, &settings, dir.path(), "Hazus 5.1")
        .run(&mut session, &combinations, &mut catalog, &mut summary)
        .await;
    assert!(catalog.events().is_empty());
}
