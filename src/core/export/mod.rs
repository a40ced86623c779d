//! Export orchestration and coordination
//!
//! This module provides the export logic for Lossport, including:
//! - Per-combination export with failure isolation
//! - End-to-end coordination of one package region
//! - Summary and reporting

pub mod coordinator;
pub mod orchestrator;
pub mod summary;

pub use coordinator::ExportCoordinator;
pub use orchestrator::ExportOrchestrator;
pub use summary::{RunFailure, RunFailureKind, RunSummary};
