//! Core business logic for Lossport.
//!
//! This module contains the pipeline stages and their orchestration.
//!
//! # Modules
//!
//! - [`restore`] - Backing store restoration and teardown
//! - [`enumerate`] - Hazard/scenario/return-period discovery
//! - [`export`] - Export orchestration, coordination and run summaries
//! - [`catalog`] - Event/Analysis/Download catalog tables
//!
//! # Export Workflow
//!
//! 1. **Decode**: Read hazards and product version from the archive comment
//! 2. **Restore**: Unpack the archive and restore its `.bk` image
//! 3. **Enumerate**: Ask each hazard's provider for scenarios and return periods
//! 4. **Export**: Write every result kind in every accepted format
//! 5. **Catalog**: Write `Event.csv`, `Analysis.csv` and `Download.csv`
//! 6. **Teardown**: Drop the store and delete the working directory
//!
//! # Example
//!
//! ```rust,no_run
//! use lossport::config::load_config;
//! use lossport::core::export::ExportCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("lossport.toml")?;
//!
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let coordinator = ExportCoordinator::new(config, shutdown_rx);
//!
//! let summary = coordinator.execute_export().await?;
//!
//! println!("Combinations: {}", summary.combinations);
//! println!("Files written: {}", summary.artifacts_written);
//! println!("Failures: {}", summary.failures.len());
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod enumerate;
pub mod export;
pub mod restore;
