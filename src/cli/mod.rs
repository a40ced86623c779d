//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Lossport using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Lossport - Hazus package region export tool
#[derive(Parser, Debug)]
#[command(name = "lossport")]
#[command(version, about, long_about = None)]
#[command(author = "Lossport Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "lossport.toml", env = "LOSSPORT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "LOSSPORT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Restore a package region and export its results
    Export(commands::export::ExportArgs),

    /// Print the metadata of a package region archive
    Inspect(commands::inspect::InspectArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
