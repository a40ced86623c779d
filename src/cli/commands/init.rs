//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "lossport.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Lossport configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Set LOSSPORT_STORE_PASSWORD in the environment or a .env file");
                println!("  3. Validate configuration: lossport validate-config");
                println!("  4. Inspect an archive: lossport inspect Region.hpr");
                println!("  5. Run export: lossport export --archive Region.hpr");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Lossport Configuration File
# Hazus package region export

[application]
log_level = "info"

[archive]
# path = "C:/workspace/hprfiles/Region.hpr"
output_dir = "./output"

[store]
endpoints = ["localhost\\HAZUSPLUSSRVR"]
username = "SA"
password = "${LOSSPORT_STORE_PASSWORD}"

[export]
formats = ["csv", "shapefile", "geojson"]
return_period_label = "STAGE"

[catalog]
analysis_type = ""
source = ""
modified_inventory = ""

[cleanup]
drop_store = true
delete_working_dir = true

[logging]
local_enabled = true
local_path = "./logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Lossport Configuration File
# Hazus package region export
#
# This file contains all configuration options with examples and explanations.
# Any value may reference an environment variable as ${VAR_NAME}, and any key
# may be overridden with LOSSPORT_<SECTION>_<KEY>.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Archive
# ============================================================================
[archive]
# Package region archive; `lossport export --archive` takes precedence
# path = "C:/workspace/hprfiles/Region.hpr"

# Results land in <output_dir>/<archive stem>, the archive is unpacked into
# <output_dir>/<archive stem>_temp
output_dir = "./output"

# ============================================================================
# Backing Store (SQL Server)
# ============================================================================
[store]
# Endpoints are tried in order; host[\instance][,port]
endpoints = ["localhost\\HAZUSPLUSSRVR", "localhost,1433"]

# SQL login with permission to restore databases
username = "SA"
password = "${LOSSPORT_STORE_PASSWORD}"

# Accept the server certificate without validation
trust_server_certificate = true

# Per-endpoint connect timeout
connect_timeout_seconds = 15

# Per-statement timeout
query_timeout_seconds = 600

# Limit on the restore itself; 0 waits until the server finishes
restore_timeout_seconds = 0

# ============================================================================
# Export
# ============================================================================
[export]
# csv | shapefile | geojson
formats = ["csv", "shapefile", "geojson"]

# results | building_damage_by_occupancy | building_damage_by_type |
# damaged_facilities | casualties
result_kinds = [
    "results",
    "building_damage_by_occupancy",
    "building_damage_by_type",
    "damaged_facilities",
    "casualties",
]

# Restrict to some hazards or scenarios (empty = everything in the archive)
hazards = []
scenarios = []

# Return period directories are named <label>_<return period>
return_period_label = "STAGE"

# Deadline for one hazard/scenario/return-period combination
combination_timeout_seconds = 1800

# ============================================================================
# Catalog
# ============================================================================
[catalog]
# Written to every Analysis row
analysis_type = ""
source = ""
modified_inventory = ""

# ============================================================================
# Cleanup
# ============================================================================
[cleanup]
# Drop the restored database when the run ends (`--keep-store` overrides)
drop_store = true

# Remove the unpacked archive when the run ends (`--keep-working-dir` overrides)
delete_working_dir = true

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable local JSON file logging
local_enabled = true

# Local log directory
local_path = "./logs"

# Log rotation (daily, hourly or never)
local_rotation = "daily"
"#
        .to_string()
    }
}
