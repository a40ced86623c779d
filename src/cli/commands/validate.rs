//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Lossport configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    ///
    /// Loading already validates every section, so a loaded file is valid.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(2); // Configuration error exit code
            }
        };

        let formats: Vec<String> = config.export.formats.iter().map(|f| f.to_string()).collect();
        let kinds: Vec<String> = config
            .export
            .result_kinds
            .iter()
            .map(|k| k.to_string())
            .collect();

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!(
            "  Archive: {}",
            config.archive.path.as_deref().unwrap_or("(pass --archive)")
        );
        println!("  Output Root: {}", config.archive.output_dir);
        println!("  Store Endpoints: {}", config.store.endpoints.join(", "));
        println!("  Store User: {}", config.store.username);
        println!("  Formats: {}", formats.join(", "));
        println!("  Result Kinds: {}", kinds.join(", "));
        println!(
            "  Hazards: {}",
            if config.export.hazards.is_empty() {
                "all present".to_string()
            } else {
                format!("{:?}", config.export.hazards)
            }
        );
        println!(
            "  Return Period Directories: {}_<period>",
            config.export.return_period_label
        );
        println!(
            "  Combination Timeout: {}s",
            config.export.combination_timeout_seconds
        );
        println!(
            "  Cleanup: drop_store={}, delete_working_dir={}",
            config.cleanup.drop_store, config.cleanup.delete_working_dir
        );
        println!();
        Ok(0)
    }
}
