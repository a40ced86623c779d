//! Domain error types
//!
//! This module defines the error hierarchy for Lossport. Variants are split
//! between fatal pipeline errors (archive format, backing image, connection,
//! restore) that abort a run, and recoverable ones (store queries, providers,
//! exports) that the orchestrator catches at the narrowest scope.
//! Errors don't expose third-party types.

use crate::domain::hazard::Hazard;
use crate::domain::results::ResultKind;
use std::path::PathBuf;
use thiserror::Error;

/// Main Lossport error type
#[derive(Debug, Error)]
pub enum LossportError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The archive comment could not be decoded
    #[error("Archive format error: {0}")]
    ArchiveFormat(String),

    /// No database image was found in the unpacked archive
    #[error("No backing image (*.bk) found under {}", .0.display())]
    NoBackingImage(PathBuf),

    /// None of the configured store endpoints accepted a connection
    #[error("No store connection available: {0}")]
    ConnectionUnavailable(String),

    /// A restore step failed
    #[error("Restore failed: {0}")]
    RestoreFailed(String),

    /// Backing store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Result provider errors
    #[error("Result provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A single format export failed
    #[error("Export error: {0}")]
    Export(String),

    /// Catalog rows reference missing parents
    #[error("Catalog integrity error: {0}")]
    CatalogIntegrity(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Backing store errors
///
/// Errors that occur when talking to the SQL Server instance hosting the
/// restored store. These errors don't expose driver types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to connect to an endpoint
    #[error("Failed to connect to {endpoint}: {message}")]
    ConnectionFailed { endpoint: String, message: String },

    /// Query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Statement failed
    #[error("Statement failed: {0}")]
    ExecuteFailed(String),

    /// Timeout
    #[error("Store operation timed out after {0}s")]
    Timeout(u64),
}

/// Result provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider has no query for this result kind
    #[error("{kind} is not available for {hazard}")]
    Unsupported { hazard: Hazard, kind: ResultKind },

    /// No provider is registered for a hazard
    #[error("No result provider registered for {0}")]
    MissingProvider(Hazard),
}

// Conversion from std::io::Error
impl From<std::io::Error> for LossportError {
    fn from(err: std::io::Error) -> Self {
        LossportError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for LossportError {
    fn from(err: serde_json::Error) -> Self {
        LossportError::Serialization(err.to_string())
    }
}

// Conversion from csv::Error
impl From<csv::Error> for LossportError {
    fn from(err: csv::Error) -> Self {
        LossportError::Serialization(format!("CSV error: {err}"))
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for LossportError {
    fn from(err: toml::de::Error) -> Self {
        LossportError::Configuration(format!("TOML parse error: {err}"))
    }
}
