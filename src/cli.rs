//! CLI definitions for chartwright
//!
//! This module contains all CLI argument parsing structures using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "chartwright",
    version,
    about = "Install, upgrade, health-check and restart chart deployments",
    long_about = "Drives a templated application release on Kubernetes.\nConfiguration is read from {config-dir}/{mode}/."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Deployment mode (selects the configuration directory)
    #[arg(short, long, global = true, default_value = "development")]
    pub mode: String,

    /// Root directory holding one subdirectory per mode
    #[arg(long, global = true, env = "CHARTWRIGHT_CONFIG_DIR", default_value = "config")]
    pub config_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install the release if absent, upgrade it otherwise
    Deploy,

    /// Install the release; does nothing when it already exists
    Install,

    /// Upgrade the release, carrying over stored credentials
    Upgrade,

    /// Report release, process and database status
    Status {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Stop the application, run module migrations and start it again
    Restart {
        /// Comma-separated modules to install during the migration
        #[arg(long)]
        install: Option<String>,

        /// Comma-separated modules to update during the migration
        #[arg(long)]
        update: Option<String>,
    },
}

impl Commands {
    /// Install and upgrade render values that embed the TLS material
    pub fn needs_tls(&self) -> bool {
        matches!(self, Self::Deploy | Self::Install | Self::Upgrade)
    }
}

/// Output format for the status command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
