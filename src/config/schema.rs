//! Configuration schema types
//!
//! This module defines the configuration structure for Lossport.

use crate::config::SecretString;
use crate::domain::{Hazard, OutputFormat, ResultKind};
use serde::{Deserialize, Serialize};

/// Main Lossport configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LossportConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Input archive and output root
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Backing store connection
    pub store: StoreConnectionConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Catalog column values supplied by the operator
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Teardown settings
    #[serde(default)]
    pub cleanup: CleanupConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LossportConfig {
    /// Loads, substitutes, overrides and validates a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::domain::Result<Self> {
        super::loader::load_config(path)
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.archive.validate()?;
        self.store.validate()?;
        self.export.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Archive input and output root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Package region archive (`.hpr`); may instead be given on the command line
    #[serde(default)]
    pub path: Option<String>,

    /// Root under which `<stem>/` and `<stem>_temp/` are created
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl ArchiveConfig {
    fn validate(&self) -> Result<(), String> {
        if self.output_dir.trim().is_empty() {
            return Err("archive.output_dir cannot be empty".to_string());
        }
        if let Some(path) = &self.path {
            if path.trim().is_empty() {
                return Err("archive.path cannot be empty when set".to_string());
            }
        }
        Ok(())
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            path: None,
            output_dir: default_output_dir(),
        }
    }
}

/// SQL Server connection settings
///
/// Endpoints are tried in order; the first that accepts a connection is used
/// for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConnectionConfig {
    /// Candidate endpoints in `host[\instance][,port]` form
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,

    /// SQL login
    #[serde(default = "default_username")]
    pub username: String,

    /// SQL login password
    /// Stored securely in memory and automatically zeroized on drop
    pub password: SecretString,

    /// Accept the server certificate without validation
    #[serde(default = "default_true")]
    pub trust_server_certificate: bool,

    /// Per-endpoint connect timeout in seconds
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,

    /// Per-statement timeout in seconds
    #[serde(default = "default_query_timeout_seconds")]
    pub query_timeout_seconds: u64,

    /// Limit on `RESTORE DATABASE` in seconds; 0 waits until it completes
    #[serde(default)]
    pub restore_timeout_seconds: u64,
}

impl StoreConnectionConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.endpoints.is_empty() {
            return Err("store.endpoints cannot be empty".to_string());
        }
        if let Some(blank) = self.endpoints.iter().position(|e| e.trim().is_empty()) {
            return Err(format!("store.endpoints[{blank}] cannot be empty"));
        }
        if self.username.trim().is_empty() {
            return Err("store.username cannot be empty".to_string());
        }
        if self.password.expose_secret().is_empty() {
            return Err("store.password cannot be empty".to_string());
        }
        if self.connect_timeout_seconds == 0 {
            return Err("store.connect_timeout_seconds must be > 0".to_string());
        }
        if self.query_timeout_seconds == 0 {
            return Err("store.query_timeout_seconds must be > 0".to_string());
        }
        Ok(())
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Output formats to write
    #[serde(default = "default_formats")]
    pub formats: Vec<OutputFormat>,

    /// Result kinds to request for every combination
    #[serde(default = "default_result_kinds")]
    pub result_kinds: Vec<ResultKind>,

    /// Restrict the run to these hazards (empty = all present)
    #[serde(default)]
    pub hazards: Vec<Hazard>,

    /// Restrict the run to these scenario names (empty = all)
    #[serde(default)]
    pub scenarios: Vec<String>,

    /// Prefix of the return-period directory, `<label>_<rp>`
    #[serde(default = "default_return_period_label")]
    pub return_period_label: String,

    /// Deadline for one hazard/scenario/return-period combination
    #[serde(default = "default_combination_timeout_seconds")]
    pub combination_timeout_seconds: u64,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.formats.is_empty() {
            return Err("export.formats cannot be empty".to_string());
        }

        if self.result_kinds.is_empty() {
            return Err("export.result_kinds cannot be empty".to_string());
        }

        let label = self.return_period_label.trim();
        if label.is_empty() {
            return Err("export.return_period_label cannot be empty".to_string());
        }
        if label.contains(['/', '\\']) {
            return Err(format!(
                "export.return_period_label '{}' must not contain path separators",
                self.return_period_label
            ));
        }

        if self.combination_timeout_seconds == 0 {
            return Err("export.combination_timeout_seconds must be > 0".to_string());
        }

        Ok(())
    }

    /// Whether a hazard passes the configured filter
    pub fn includes_hazard(&self, hazard: Hazard) -> bool {
        self.hazards.is_empty() || self.hazards.contains(&hazard)
    }

    /// Whether a scenario passes the configured filter
    pub fn includes_scenario(&self, scenario: &str) -> bool {
        self.scenarios.is_empty() || self.scenarios.iter().any(|s| s.trim() == scenario.trim())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            formats: default_formats(),
            result_kinds: default_result_kinds(),
            hazards: Vec::new(),
            scenarios: Vec::new(),
            return_period_label: default_return_period_label(),
            combination_timeout_seconds: default_combination_timeout_seconds(),
        }
    }
}

/// Analysis columns the store cannot supply
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub analysis_type: String,

    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub modified_inventory: String,
}

/// Teardown configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Drop the restored database at the end of the run
    #[serde(default = "default_true")]
    pub drop_store: bool,

    /// Remove the unpacked working directory at the end of the run
    #[serde(default = "default_true")]
    pub delete_working_dir: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            drop_store: true,
            delete_working_dir: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> String {
    "./output".to_string()
}

fn default_endpoints() -> Vec<String> {
    vec!["localhost\\HAZUSPLUSSRVR".to_string()]
}

fn default_username() -> String {
    "SA".to_string()
}

fn default_connect_timeout_seconds() -> u64 {
    15
}

fn default_query_timeout_seconds() -> u64 {
    600
}

fn default_formats() -> Vec<OutputFormat> {
    OutputFormat::ALL.to_vec()
}

fn default_result_kinds() -> Vec<ResultKind> {
    ResultKind::ALL.to_vec()
}

fn default_return_period_label() -> String {
    "STAGE".to_string()
}

fn default_combination_timeout_seconds() -> u64 {
    1800
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
