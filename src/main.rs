use anyhow::{Context, Result};
use clap::Parser;

// Core modules
mod cli;
mod commands;
mod config;

mod k8s;
mod tools;

// Layered architecture
mod domain;
mod error;
mod infrastructure;
mod services;
mod ui;

#[cfg(test)]
mod testing;

use cli::{Cli, Commands};
use commands::{deploy, restart, status};
use config::{DeployConfig, TlsRequirement};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with LOGGING env var support
    // LOGGING=debug,info,warn,error or just LOGGING=debug
    let log_level = std::env::var("LOGGING")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| {
            if cli.verbose {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(false)
        .init();

    // Configuration errors abort before any cluster call
    let tls_requirement = if cli.command.needs_tls() {
        TlsRequirement::Required
    } else {
        TlsRequirement::NotNeeded
    };
    let config = DeployConfig::load(&cli.config_dir, &cli.mode, tls_requirement).with_context(|| {
        format!(
            "Failed to load {} configuration from {}",
            cli.mode,
            cli.config_dir.display()
        )
    })?;

    match cli.command {
        Commands::Deploy => deploy::execute(&config, deploy::DeployAction::Auto).await,
        Commands::Install => deploy::execute(&config, deploy::DeployAction::Install).await,
        Commands::Upgrade => deploy::execute(&config, deploy::DeployAction::Upgrade).await,
        Commands::Status { output } => status::execute(&config, output).await,
        Commands::Restart { install, update } => restart::execute(&config, install, update).await,
    }
}
