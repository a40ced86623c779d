//! Run summary and reporting
//!
//! This module defines structures for tracking and reporting the outcome of a
//! package region export. Recovered failures are collected here rather than
//! aborting the run.

use std::time::Duration;

/// Summary of an export run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Archive processed
    pub package: String,

    /// Hazards present in the archive
    pub hazards: usize,

    /// Combinations enumerated
    pub combinations: usize,

    /// Combinations that ran to completion
    pub completed_combinations: usize,

    /// Files written
    pub artifacts_written: usize,

    /// Result kinds a provider could not produce
    pub unsupported_kinds: usize,

    /// Whether the run stopped early on a shutdown signal
    pub interrupted: bool,

    /// Duration of the run
    pub duration: Duration,

    /// Recovered failures
    pub failures: Vec<RunFailure>,
}

impl RunSummary {
    /// Create a new empty summary
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            hazards: 0,
            combinations: 0,
            completed_combinations: 0,
            artifacts_written: 0,
            unsupported_kinds: 0,
            interrupted: false,
            duration: Duration::from_secs(0),
            failures: Vec::new(),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Record a failure
    pub fn add_failure(&mut self, failure: RunFailure) {
        self.failures.push(failure);
    }

    /// Number of failures of one kind
    pub fn failure_count(&self, kind: RunFailureKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }

    /// Check if every attempted step succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.interrupted
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            package = %self.package,
            hazards = self.hazards,
            combinations = self.combinations,
            completed = self.completed_combinations,
            artifacts = self.artifacts_written,
            unsupported_kinds = self.unsupported_kinds,
            interrupted = self.interrupted,
            duration_secs = self.duration.as_secs(),
            "Export completed"
        );

        if !self.failures.is_empty() {
            tracing::warn!(
                failure_count = self.failures.len(),
                "Export completed with recovered failures"
            );
            for failure in &self.failures {
                tracing::warn!(
                    kind = ?failure.kind,
                    message = %failure.message,
                    context = failure.context.as_deref().unwrap_or(""),
                    "Recovered failure"
                );
            }
        }
    }
}

/// Stage a recovered failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunFailureKind {
    /// Listing scenarios or return periods
    Enumeration,
    /// Building a result set
    Provider,
    /// Writing one format of one result set
    Export,
    /// A combination exceeded its deadline
    Timeout,
}

/// A recovered failure with context
#[derive(Debug, Clone)]
pub struct RunFailure {
    pub kind: RunFailureKind,

    pub message: String,

    /// Optional context (e.g. hazard, scenario, return period, format)
    pub context: Option<String>,
}

impl RunFailure {
    /// Create a new failure
    pub fn new(kind: RunFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: None,
        }
    }

    /// Add context to the failure
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}
