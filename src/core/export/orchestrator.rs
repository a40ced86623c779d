//! Per-combination export loop
//!
//! For every enumerated (hazard, scenario, return period) the orchestrator
//! requests each configured result kind from the hazard's provider, writes
//! every accepted format and records the written files in the catalog.
//! Nothing below a combination aborts the run.

use crate::adapters::exporters::exporter_for;
use crate::adapters::results::{ProviderRegistry, ResultProvider};
use crate::adapters::store::{StoreConnector, StoreSession};
use crate::config::ExportConfig;
use crate::core::catalog::CatalogBuilder;
use crate::core::enumerate::HazardCombinations;
use crate::core::export::summary::{RunFailure, RunFailureKind, RunSummary};
use crate::domain::{
    AnalysisId, Artifact, LossportError, OutputFormat, ProviderError, ResultKind, ResultSet,
    Selection, RESULTS_SUBCATEGORY,
};
use crate::log_combination_start;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;

/// Analysis metadata key carrying the product version
pub const VERSION_META_KEY: &str = "HazusVersion";

/// Progress of one combination, kept outside the timed future so a timeout
/// does not lose what was already written
#[derive(Debug, Default)]
struct CombinationOutcome {
    artifacts: Vec<Artifact>,
    failures: Vec<RunFailure>,
    unsupported: usize,
}

/// Drives the export of every combination of one package
pub struct ExportOrchestrator<'a> {
    registry: &'a ProviderRegistry,
    settings: &'a ExportConfig,
    package_dir: PathBuf,
    product_label: String,
    shutdown: Option<watch::Receiver<bool>>,
    connector: Option<&'a dyn StoreConnector>,
}

impl<'a> ExportOrchestrator<'a> {
    pub fn new(
        registry: &'a ProviderRegistry,
        settings: &'a ExportConfig,
        package_dir: impl Into<PathBuf>,
        product_label: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            settings,
            package_dir: package_dir.into(),
            product_label: product_label.into(),
            shutdown: None,
            connector: None,
        }
    }

    /// Reopen the session through `connector` after a combination times out
    pub fn with_reconnect(mut self, connector: &'a dyn StoreConnector) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Stop between combinations once the receiver reads `true`
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Exports every combination, appending catalog rows as files land
    pub async fn run(
        &self,
        session: &mut StoreSession,
        combinations: &[HazardCombinations],
        catalog: &mut CatalogBuilder,
        summary: &mut RunSummary,
    ) {
        let total: usize = combinations.iter().map(|h| h.combination_count()).sum();
        summary.combinations += total;
        let deadline = Duration::from_secs(self.settings.combination_timeout_seconds);
        let mut current = 0;

        for found in combinations {
            let provider = match self.registry.get(found.hazard) {
                Ok(provider) => provider,
                Err(e) => {
                    tracing::error!(hazard = %found.hazard, error = %e, "No provider for hazard");
                    summary.add_failure(
                        RunFailure::new(RunFailureKind::Provider, e.to_string())
                            .with_context(format!("hazard={}", found.hazard)),
                    );
                    continue;
                }
            };

            let event_id = catalog.add_event(found.hazard);

            for scenario in &found.scenarios {
                let meta = BTreeMap::from([(
                    VERSION_META_KEY.to_string(),
                    self.product_label.clone(),
                )]);
                let analysis_id =
                    catalog.add_analysis(&scenario.name, found.hazard, event_id, meta);

                for return_period in &scenario.return_periods {
                    if self.shutdown_requested() {
                        tracing::warn!(
                            completed = summary.completed_combinations,
                            total,
                            "Shutdown requested, stopping before next combination"
                        );
                        summary.interrupted = true;
                        return;
                    }

                    current += 1;
                    let selection = Selection::new(found.hazard, &scenario.name, return_period);
                    log_combination_start!(&selection, current, total);

                    let mut outcome = CombinationOutcome::default();
                    let timed = tokio::time::timeout(
                        deadline,
                        self.export_combination(
                            provider,
                            session,
                            &selection,
                            analysis_id,
                            &mut outcome,
                        ),
                    )
                    .await;

                    match timed {
                        Ok(()) => summary.completed_combinations += 1,
                        Err(_) => {
                            tracing::error!(
                                selection = %selection,
                                timeout_secs = deadline.as_secs(),
                                "Combination exceeded its deadline"
                            );
                            outcome.failures.push(
                                RunFailure::new(
                                    RunFailureKind::Timeout,
                                    format!(
                                        "Combination abandoned after {}s",
                                        deadline.as_secs()
                                    ),
                                )
                                .with_context(selection.to_string()),
                            );
                            if let Some(failure) = self.reconnect(session).await {
                                outcome.failures.push(failure.with_context(selection.to_string()));
                            }
                        }
                    }

                    summary.unsupported_kinds += outcome.unsupported;
                    summary.artifacts_written += outcome.artifacts.len();
                    for artifact in outcome.artifacts {
                        catalog.add_download(artifact);
                    }
                    for failure in outcome.failures {
                        summary.add_failure(failure);
                    }
                }
            }
        }
    }

    async fn export_combination(
        &self,
        provider: &dyn ResultProvider,
        session: &mut StoreSession,
        selection: &Selection,
        analysis_id: AnalysisId,
        outcome: &mut CombinationOutcome,
    ) {
        let dir = selection.export_dir(&self.package_dir, &self.settings.return_period_label);
        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::error!(dir = %dir.display(), error = %e, "Failed to create export directory");
            outcome.failures.push(
                RunFailure::new(
                    RunFailureKind::Export,
                    format!("Failed to create {}: {e}", dir.display()),
                )
                .with_context(selection.to_string()),
            );
            return;
        }

        let mut sets = Vec::with_capacity(self.settings.result_kinds.len());
        for &kind in &self.settings.result_kinds {
            match provider.result_set(session, selection, kind).await {
                Ok(set) => {
                    if kind == ResultKind::Results && set.is_empty() {
                        tracing::warn!(selection = %selection, "No results for combination");
                    }
                    sets.push(set);
                }
                Err(LossportError::Provider(ProviderError::Unsupported { .. })) => {
                    tracing::debug!(selection = %selection, kind = %kind, "Result kind not available");
                    outcome.unsupported += 1;
                }
                Err(e) => {
                    tracing::error!(
                        selection = %selection,
                        kind = %kind,
                        error = %e,
                        "Failed to build result set"
                    );
                    outcome.failures.push(
                        RunFailure::new(RunFailureKind::Provider, e.to_string())
                            .with_context(format!("{selection}, kind={kind}")),
                    );
                }
            }
        }

        for &format in &self.settings.formats {
            let exporter = exporter_for(format);
            for set in sets.iter().filter(|s| format.accepts(s.kind)) {
                let name = format.file_name(set.kind);
                let path = dir.join(&name);
                match exporter.export(set, &path) {
                    Ok(()) => {
                        tracing::debug!(path = %path.display(), rows = set.len(), "Wrote export");
                        outcome.artifacts.push(Artifact {
                            category: selection.return_period().to_string(),
                            subcategory: RESULTS_SUBCATEGORY.to_string(),
                            icon: format.icon(),
                            file: self.relative_file(&path),
                            name,
                            analysis_id,
                        });
                    }
                    Err(e) => {
                        tracing::error!(
                            path = %path.display(),
                            format = %format,
                            error = %e,
                            "Export failed"
                        );
                        outcome.failures.push(
                            RunFailure::new(RunFailureKind::Export, e.to_string())
                                .with_context(describe(selection, set, format)),
                        );
                    }
                }
            }
        }
    }

    /// Replaces a session whose last statement was cut off mid-stream
    async fn reconnect(&self, session: &mut StoreSession) -> Option<RunFailure> {
        let connector = self.connector?;
        let endpoint = session.endpoint().to_string();

        match connector.connect(&endpoint).await {
            Ok(client) => {
                session.replace_client(client);
                tracing::info!(endpoint = %endpoint, "Reconnected to store after timeout");
                None
            }
            Err(e) => {
                tracing::error!(
                    endpoint = %endpoint,
                    error = %e,
                    "Failed to reconnect after timeout, keeping the old connection"
                );
                Some(RunFailure::new(
                    RunFailureKind::Timeout,
                    format!("Reconnect to {endpoint} failed: {e}"),
                ))
            }
        }
    }

    /// Path under the package directory with `/` separators
    fn relative_file(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.package_dir).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn describe(selection: &Selection, set: &ResultSet, format: OutputFormat) -> String {
    format!("{selection}, kind={}, format={format}", set.kind)
}
