//! Inspect command implementation
//!
//! Prints what an archive comment declares without unpacking or restoring.

use super::export::exit_code_for;
use crate::adapters::archive::ArchiveReader;
use clap::Args;

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Package region archive (.hpr)
    pub archive: String,

    /// Print the metadata as JSON
    #[arg(long)]
    pub json: bool,
}

impl InspectArgs {
    /// Execute the inspect command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(archive = %self.archive, "Inspecting archive");

        let metadata = match ArchiveReader::open(&self.archive).and_then(|r| r.metadata()) {
            Ok(m) => m,
            Err(e) => {
                println!("❌ Failed to read archive: {}", self.archive);
                println!("   Error: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&metadata)?);
            return Ok(0);
        }

        let hazards: Vec<&str> = metadata.hazards.iter().map(|h| h.as_str()).collect();
        println!("📦 {}", self.archive);
        println!("  Region: {}", metadata.region_name);
        println!(
            "  Product: {} ({})",
            metadata.product_version,
            metadata.product_version.code()
        );
        println!("  Format Version: {}", metadata.format_version);
        println!("  Backup Image: {}", metadata.image_file_name);
        println!(
            "  Hazards: {}",
            if hazards.is_empty() {
                "none".to_string()
            } else {
                hazards.join(", ")
            }
        );
        if !metadata.product_version.is_known() {
            println!("  ⚠️  Unrecognized product version code");
        }

        Ok(0)
    }
}
