// Lossport - Hazus package region export tool
// Copyright (c) 2025 Lossport Contributors
// Licensed under the MIT License

//! # Lossport - Hazus package region export
//!
//! Lossport restores a Hazus package region archive (`.hpr`) into SQL Server
//! and republishes its pre-computed loss results as files plus a catalog for
//! a downstream loss library.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Decoding** the archive comment (product version, hazards present)
//! - **Restoring** the embedded backup image into a named database
//! - **Enumerating** every hazard × scenario × return-period combination
//! - **Exporting** each combination's result sets to CSV, shapefile and GeoJSON
//! - **Cataloging** the written files in Event/Analysis/Download tables
//!
//! ## Architecture
//!
//! Lossport follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Pipeline stages (restore, enumerate, export, catalog)
//! - [`adapters`] - External integrations (archive, SQL Server, result providers, file formats)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lossport::config::LossportConfig;
//! use lossport::core::export::ExportCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LossportConfig::from_file("lossport.toml")?;
//!
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!     let coordinator = ExportCoordinator::new(config, shutdown_rx);
//!
//!     let summary = coordinator.execute_export().await?;
//!
//!     println!("Wrote {} files", summary.artifacts_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Output Layout
//!
//! ```text
//! <output_dir>/<archive stem>/
//!     Event.csv
//!     Analysis.csv
//!     Download.csv
//!     <hazard>/<scenario>/STAGE_<return period>/
//!         results.csv  results.shp  results.geojson
//!         building_damage_by_occupancy.csv
//!         building_damage_by_type.csv
//!         damaged_facilities.csv  damaged_facilities.shp  damaged_facilities.geojson
//!         casualties.csv
//! ```
//!
//! ## Error Handling
//!
//! Lossport uses the [`domain::LossportError`] type for all errors. Failures
//! inside one combination are recovered and recorded in the run summary;
//! archive, restore and catalog failures abort the run:
//!
//! ```rust,no_run
//! use lossport::domain::LossportError;
//!
//! fn example() -> Result<(), LossportError> {
//!     let config = lossport::config::LossportConfig::from_file("lossport.toml")?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
