//! Export coordinator - runs one package region end to end
//!
//! This module sequences the pipeline: decode the archive, restore its
//! backing store, enumerate combinations, export them, write the catalog and
//! tear everything down again. Teardown runs whether or not the stages before
//! it succeeded.

use crate::adapters::archive::ArchiveReader;
use crate::adapters::results::ProviderRegistry;
use crate::adapters::store::{SqlServerConnector, StoreConnector, StoreSession};
use crate::config::LossportConfig;
use crate::core::catalog::CatalogBuilder;
use crate::core::enumerate::enumerate;
use crate::core::export::orchestrator::ExportOrchestrator;
use crate::core::export::summary::RunSummary;
use crate::core::restore::{delete_working_dir, drop_store, BackingStoreRestorer};
use crate::domain::{ArchiveMetadata, LossportError, Package, PackagePaths, Result};
use crate::log_export_complete;
use std::time::Instant;
use tokio::sync::watch;

/// Export coordinator
pub struct ExportCoordinator {
    config: LossportConfig,
    connector: Box<dyn StoreConnector>,
    registry: ProviderRegistry,
    shutdown_signal: watch::Receiver<bool>,
}

impl ExportCoordinator {
    /// Create a coordinator backed by SQL Server and the Hazus providers
    pub fn new(config: LossportConfig, shutdown_signal: watch::Receiver<bool>) -> Self {
        let connector = Box::new(SqlServerConnector::new(&config.store));
        Self::with_backends(config, connector, ProviderRegistry::hazus(), shutdown_signal)
    }

    /// Create a coordinator with an explicit connector and provider registry
    pub fn with_backends(
        config: LossportConfig,
        connector: Box<dyn StoreConnector>,
        registry: ProviderRegistry,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            connector,
            registry,
            shutdown_signal,
        }
    }

    /// Execute the export
    ///
    /// This is the main entry point for a run. It:
    /// 1. Decodes the archive comment
    /// 2. Unpacks the archive into `<output>/<stem>_temp`
    /// 3. Identifies and restores the backup image
    /// 4. Enumerates hazard/scenario/return-period combinations
    /// 5. Exports every combination into `<output>/<stem>`
    /// 6. Writes the catalog
    /// 7. Drops the store and deletes the working directory
    ///
    /// Recovered failures land in the returned summary. Fatal errors are
    /// returned after teardown.
    pub async fn execute_export(&self) -> Result<RunSummary> {
        let start_time = Instant::now();

        let archive = self.config.archive.path.as_deref().ok_or_else(|| {
            LossportError::Configuration(
                "No archive given; set archive.path or pass --archive".to_string(),
            )
        })?;
        let paths = PackagePaths::new(archive, &self.config.archive.output_dir)?;
        let reader = ArchiveReader::open(&paths.source)?;
        let metadata = reader.metadata()?;

        tracing::info!(
            archive = %paths.source.display(),
            region = %metadata.region_name,
            product = %metadata.product_version,
            hazards = ?metadata.hazards,
            "Starting export process"
        );

        let mut summary = RunSummary::new(paths.stem());
        summary.hazards = metadata.hazards.len();

        let working_dir = paths.working_dir.clone();
        let outcome = self
            .restore_and_export(paths, reader, metadata, &mut summary)
            .await;

        if self.config.cleanup.delete_working_dir {
            delete_working_dir(&working_dir);
        } else {
            tracing::info!(path = %working_dir.display(), "Keeping working directory");
        }

        outcome?;

        let duration = start_time.elapsed();
        log_export_complete!(summary.artifacts_written, duration);
        summary = summary.with_duration(duration);
        summary.log_summary();

        Ok(summary)
    }

    async fn restore_and_export(
        &self,
        paths: PackagePaths,
        reader: ArchiveReader,
        metadata: ArchiveMetadata,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let restorer = tokio::task::spawn_blocking(move || {
            BackingStoreRestorer::unpack(paths, &reader)
        })
        .await
        .map_err(|e| LossportError::Other(format!("Unpack task failed: {e}")))??;

        let restorer = restorer
            .identify()?
            .connect(self.connector.as_ref(), &self.config.store.endpoints)
            .await?
            .restore()
            .await?;

        let image_stem = restorer
            .image()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (paths, mut session) = restorer.into_parts();
        let package = Package {
            store_name: session.store_name().to_string(),
            image_stem,
            paths,
            metadata,
        };

        let exported = self.export_package(&package, &mut session, summary).await;

        if self.config.cleanup.drop_store {
            drop_store(&mut session).await;
        } else {
            tracing::info!(store = %package.store_name, "Keeping backing store");
        }

        exported
    }

    async fn export_package(
        &self,
        package: &Package,
        session: &mut StoreSession,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let combinations = enumerate(
            session,
            &self.registry,
            package.hazards(),
            &self.config.export,
            summary,
        )
        .await;

        let mut catalog = CatalogBuilder::new(&package.image_stem, self.config.catalog.clone());
        ExportOrchestrator::new(
            &self.registry,
            &self.config.export,
            &package.paths.package_dir,
            package.metadata.product_version.label(),
        )
        .with_shutdown(self.shutdown_signal.clone())
        .with_reconnect(self.connector.as_ref())
        .run(session, &combinations, &mut catalog, summary)
        .await;

        catalog.finalize(&package.paths.package_dir)?;
        Ok(())
    }
}
