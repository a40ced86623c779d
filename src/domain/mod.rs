//! Domain models and types for Lossport.
//!
//! This module contains the core domain types shared by every stage of the
//! restore-and-export pipeline.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Catalog identifiers** ([`EventId`], [`AnalysisId`], [`DownloadId`])
//! - **Package metadata** ([`ArchiveMetadata`], [`PackagePaths`], [`Package`])
//! - **Query results** ([`Table`], [`Value`], [`ResultSet`], [`ResultKind`])
//! - **Export values** ([`Selection`], [`Artifact`], [`OutputFormat`])
//! - **Error types** ([`LossportError`], [`StoreError`], [`ProviderError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Catalog identifiers are distinct newtypes, so a download row cannot be
//! attached to an event by mistake:
//!
//! ```rust
//! use lossport::domain::{AnalysisId, EventId};
//!
//! let event = EventId::new();
//! let analysis = AnalysisId::new();
//!
//! // This won't compile - type safety prevents mixing IDs
//! // let wrong: EventId = analysis;  // Compile error!
//! # let _ = (event, analysis);
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, LossportError>`]:
//!
//! ```rust,no_run
//! use lossport::domain::Result;
//!
//! fn example() -> Result<()> {
//!     let config = lossport::config::LossportConfig::from_file("lossport.toml")?;
//!     Ok(())
//! }
//! ```

pub mod artifact;
pub mod errors;
pub mod hazard;
pub mod ids;
pub mod package;
pub mod result;
pub mod results;
pub mod selection;
pub mod table;

// Re-export commonly used types for convenience
pub use artifact::{Artifact, Icon, OutputFormat, RESULTS_SUBCATEGORY};
pub use errors::{LossportError, ProviderError, StoreError};
pub use hazard::{Hazard, ProductVersion};
pub use ids::{AnalysisId, DownloadId, EventId};
pub use package::{ArchiveMetadata, Package, PackagePaths};
pub use result::Result;
pub use results::{ResultKind, ResultSet};
pub use selection::Selection;
pub use table::{Table, Value};
