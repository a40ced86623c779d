//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::LossportConfig;
use super::secret::secret_string;
use crate::domain::errors::LossportError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into LossportConfig
/// 4. Applies environment variable overrides (LOSSPORT_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`LossportError::Configuration`] if the file cannot be read or
/// parsed, a referenced variable is unset, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use lossport::config::loader::load_config;
///
/// let config = load_config("lossport.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<LossportConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(LossportError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        LossportError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: LossportConfig = toml::from_str(&contents)
        .map_err(|e| LossportError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        LossportError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| LossportError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|m| m == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    caps[0].to_string()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(LossportError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using LOSSPORT_* prefix
///
/// Environment variables follow the pattern: LOSSPORT_<SECTION>_<KEY>
/// For example: LOSSPORT_STORE_ENDPOINTS, LOSSPORT_EXPORT_FORMATS.
/// List values are comma separated.
fn apply_env_overrides(config: &mut LossportConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("LOSSPORT_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Archive overrides
    if let Ok(val) = std::env::var("LOSSPORT_ARCHIVE_PATH") {
        config.archive.path = Some(val);
    }
    if let Ok(val) = std::env::var("LOSSPORT_ARCHIVE_OUTPUT_DIR") {
        config.archive.output_dir = val;
    }

    // Store overrides
    if let Ok(val) = std::env::var("LOSSPORT_STORE_ENDPOINTS") {
        config.store.endpoints = split_list(&val);
    }
    if let Ok(val) = std::env::var("LOSSPORT_STORE_USERNAME") {
        config.store.username = val;
    }
    if let Ok(val) = std::env::var("LOSSPORT_STORE_PASSWORD") {
        config.store.password = secret_string(val);
    }
    if let Ok(val) = std::env::var("LOSSPORT_STORE_TRUST_SERVER_CERTIFICATE") {
        config.store.trust_server_certificate = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("LOSSPORT_STORE_CONNECT_TIMEOUT_SECONDS") {
        if let Ok(secs) = val.parse() {
            config.store.connect_timeout_seconds = secs;
        }
    }
    if let Ok(val) = std::env::var("LOSSPORT_STORE_QUERY_TIMEOUT_SECONDS") {
        if let Ok(secs) = val.parse() {
            config.store.query_timeout_seconds = secs;
        }
    }
    if let Ok(val) = std::env::var("LOSSPORT_STORE_RESTORE_TIMEOUT_SECONDS") {
        if let Ok(secs) = val.parse() {
            config.store.restore_timeout_seconds = secs;
        }
    }

    // Export overrides
    if let Ok(val) = std::env::var("LOSSPORT_EXPORT_FORMATS") {
        config.export.formats = parse_list("LOSSPORT_EXPORT_FORMATS", &val)?;
    }
    if let Ok(val) = std::env::var("LOSSPORT_EXPORT_RESULT_KINDS") {
        config.export.result_kinds = parse_list("LOSSPORT_EXPORT_RESULT_KINDS", &val)?;
    }
    if let Ok(val) = std::env::var("LOSSPORT_EXPORT_HAZARDS") {
        config.export.hazards = parse_list("LOSSPORT_EXPORT_HAZARDS", &val)?;
    }
    if let Ok(val) = std::env::var("LOSSPORT_EXPORT_SCENARIOS") {
        config.export.scenarios = split_list(&val);
    }
    if let Ok(val) = std::env::var("LOSSPORT_EXPORT_RETURN_PERIOD_LABEL") {
        config.export.return_period_label = val;
    }
    if let Ok(val) = std::env::var("LOSSPORT_EXPORT_COMBINATION_TIMEOUT_SECONDS") {
        if let Ok(secs) = val.parse() {
            config.export.combination_timeout_seconds = secs;
        }
    }

    // Catalog overrides
    if let Ok(val) = std::env::var("LOSSPORT_CATALOG_ANALYSIS_TYPE") {
        config.catalog.analysis_type = val;
    }
    if let Ok(val) = std::env::var("LOSSPORT_CATALOG_SOURCE") {
        config.catalog.source = val;
    }
    if let Ok(val) = std::env::var("LOSSPORT_CATALOG_MODIFIED_INVENTORY") {
        config.catalog.modified_inventory = val;
    }

    // Cleanup overrides
    if let Ok(val) = std::env::var("LOSSPORT_CLEANUP_DROP_STORE") {
        config.cleanup.drop_store = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("LOSSPORT_CLEANUP_DELETE_WORKING_DIR") {
        config.cleanup.delete_working_dir = val.parse().unwrap_or(true);
    }

    // Logging overrides
    if let Ok(val) = std::env::var("LOSSPORT_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("LOSSPORT_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("LOSSPORT_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_list<T>(var: &str, value: &str) -> Result<Vec<T>>
where
    T: FromStr<Err = String>,
{
    split_list(value)
        .iter()
        .map(|item| item.parse::<T>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| LossportError::Configuration(format!("{var}: {e}")))
}
