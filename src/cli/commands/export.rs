//! Export command implementation
//!
//! This module implements the `export` command, which restores a package
//! region and writes its results and catalog.

use crate::config::load_config;
use crate::core::export::{ExportCoordinator, RunSummary};
use crate::domain::LossportError;
use clap::Args;
use tokio::sync::watch;

/// Exit code for configuration errors
pub const EXIT_CONFIG: i32 = 2;
/// Exit code when the backing store cannot be restored or reached
pub const EXIT_RESTORE: i32 = 4;
/// Exit code for any other fatal error
pub const EXIT_FATAL: i32 = 5;
/// Exit code after a shutdown signal (standard Unix convention for SIGINT)
pub const EXIT_INTERRUPTED: i32 = 130;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Package region archive (.hpr); overrides archive.path
    #[arg(short, long)]
    pub archive: Option<String>,

    /// Output root; overrides archive.output_dir
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Leave the restored database in place
    #[arg(long)]
    pub keep_store: bool,

    /// Leave the unpacked archive in place
    #[arg(long)]
    pub keep_working_dir: bool,
}

/// Maps a fatal error to the process exit code
pub fn exit_code_for(error: &LossportError) -> i32 {
    match error {
        LossportError::Configuration(_) => EXIT_CONFIG,
        LossportError::NoBackingImage(_)
        | LossportError::ConnectionUnavailable(_)
        | LossportError::RestoreFailed(_) => EXIT_RESTORE,
        _ => EXIT_FATAL,
    }
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("{e}");
                return Ok(EXIT_CONFIG);
            }
        };

        // Apply CLI overrides
        if let Some(archive) = &self.archive {
            tracing::info!(archive = %archive, "Overriding archive path from CLI");
            config.archive.path = Some(archive.clone());
        }
        if let Some(output_dir) = &self.output_dir {
            tracing::info!(output_dir = %output_dir, "Overriding output directory from CLI");
            config.archive.output_dir = output_dir.clone();
        }
        if self.keep_store {
            config.cleanup.drop_store = false;
        }
        if self.keep_working_dir {
            config.cleanup.delete_working_dir = false;
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG);
        }

        println!("🚀 Starting export...");
        println!();

        let coordinator = ExportCoordinator::new(config, shutdown_signal);
        let summary = match coordinator.execute_export().await {
            Ok(s) => s,
            Err(e) => {
                crate::log_error_with_context!(&e, "Export failed");
                eprintln!("Export failed: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        print_summary(&summary);

        let exit_code = if summary.interrupted {
            println!("⚠️  Export interrupted. Catalog written for the completed combinations.");
            tracing::info!("Export interrupted by user signal");
            EXIT_INTERRUPTED
        } else if summary.is_clean() {
            println!("✅ Export completed successfully!");
            0
        } else {
            println!("⚠️  Export completed with recovered failures");
            0
        };

        Ok(exit_code)
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("📊 Export Summary:");
    println!("  Package: {}", summary.package);
    println!("  Hazards: {}", summary.hazards);
    println!(
        "  Combinations: {}/{}",
        summary.completed_combinations, summary.combinations
    );
    println!("  Files Written: {}", summary.artifacts_written);
    println!("  Unsupported Result Kinds: {}", summary.unsupported_kinds);
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!();

    if !summary.failures.is_empty() {
        println!("⚠️  Failures recovered:");
        for (i, failure) in summary.failures.iter().enumerate() {
            if i == 10 {
                println!("  ... and {} more", summary.failures.len() - 10);
                break;
            }
            println!("  - {:?}: {}", failure.kind, failure.message);
            if let Some(context) = &failure.context {
                println!("    Context: {context}");
            }
        }
        println!();
    }
}
