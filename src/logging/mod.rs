//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Human-readable console output
//! - JSON-formatted file logs with rotation
//! - Configurable log levels
//!
//! # Example
//!
//! ```no_run
//! use lossport::logging::init_logging;
//! use lossport::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(archive = "banMO.hpr", "Restoring package region");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of one hazard/scenario/return-period combination
///
/// # Example
///
/// ```no_run
/// use lossport::log_combination_start;
/// use lossport::domain::{Hazard, Selection};
///
/// let selection = Selection::new(Hazard::Flood, "Riverine", "100");
/// log_combination_start!(&selection, 3, 12);
/// ```
#[macro_export]
macro_rules! log_combination_start {
    ($selection:expr, $current:expr, $total:expr) => {
        tracing::info!(
            hazard = %$selection.hazard(),
            scenario = %$selection.scenario(),
            return_period = %$selection.return_period(),
            current = $current,
            total = $total,
            "Processing combination"
        );
    };
}

/// Log the completion of an export run
///
/// # Example
///
/// ```no_run
/// use lossport::log_export_complete;
/// use std::time::Duration;
///
/// log_export_complete!(42, Duration::from_secs(10));
/// ```
#[macro_export]
macro_rules! log_export_complete {
    ($artifacts:expr, $duration:expr) => {
        tracing::info!(
            artifacts = $artifacts,
            duration_ms = $duration.as_millis(),
            "Export completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use lossport::log_error_with_context;
/// use lossport::domain::LossportError;
///
/// let error = LossportError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
