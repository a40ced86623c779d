//! Configuration management for Lossport.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Lossport uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `LOSSPORT_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation of every section on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use lossport::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("lossport.toml")?;
//!
//! println!("Output root: {}", config.archive.output_dir);
//! println!("Store endpoints: {:?}", config.store.endpoints);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Application settings (log level)
//! - [`ArchiveConfig`] - Input archive and output root
//! - [`StoreConnectionConfig`] - SQL Server endpoints and credentials
//! - [`ExportConfig`] - Formats, result kinds, filters and deadlines
//! - [`CatalogConfig`] - Operator-supplied Analysis columns
//! - [`CleanupConfig`] - Teardown switches
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [archive]
//! path = "C:/workspace/hprfiles/banMO.hpr"
//! output_dir = "C:/workspace"
//!
//! [store]
//! endpoints = ["WORKSTATION\\HAZUSPLUSSRVR"]
//! username = "SA"
//! password = "${LOSSPORT_STORE_PASSWORD}"
//!
//! [export]
//! formats = ["csv", "shapefile", "geojson"]
//! return_period_label = "STAGE"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, ArchiveConfig, CatalogConfig, CleanupConfig, ExportConfig, LoggingConfig,
    LossportConfig, StoreConnectionConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
