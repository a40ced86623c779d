//! External system integrations for Lossport.
//!
//! This module provides adapters for the systems a package region export
//! touches:
//!
//! - [`archive`] - Package region (`.hpr`) archive decoding and extraction
//! - [`store`] - SQL Server backing store abstraction (trait-based)
//! - [`results`] - Per-hazard result providers querying a restored store
//! - [`exporters`] - CSV, shapefile and GeoJSON writers
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with mock implementations. The store layer uses trait-based
//! abstraction so the pipeline runs against an in-memory client in tests.
//!
//! # Archive Adapter
//!
//! ```rust,no_run
//! use lossport::adapters::archive::ArchiveReader;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = ArchiveReader::open("Region.hpr")?;
//! let metadata = reader.metadata()?;
//! println!("{} ({})", metadata.region_name, metadata.product_version);
//! # Ok(())
//! # }
//! ```
//!
//! # Result Providers
//!
//! ```rust,no_run
//! use lossport::adapters::results::ProviderRegistry;
//! use lossport::adapters::store::StoreSession;
//! use lossport::domain::{Hazard, ResultKind, Selection};
//!
//! # async fn example(session: &mut StoreSession) -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ProviderRegistry::hazus();
//! let provider = registry.get(Hazard::Flood)?;
//! let selection = Selection::new(Hazard::Flood, "Riverine", "100");
//! let results = provider.result_set(session, &selection, ResultKind::Results).await?;
//! println!("{} rows", results.len());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod exporters;
pub mod results;
pub mod store;
