//! Status command
//!
//! Text output for humans, JSON (flat status tokens) for scripts.

use anyhow::{Context, Result};
use colored::Colorize;

use crate::cli::OutputFormat;
use crate::commands::build_orchestrator;
use crate::config::DeployConfig;
use crate::domain::{ApplicationStatus, DatabaseStatus, StatusReport};
use crate::ui;

pub async fn execute(config: &DeployConfig, format: OutputFormat) -> Result<()> {
    let orchestrator = build_orchestrator(config).await?;
    let report = orchestrator
        .check_status(&config.request.namespace, &config.request.build_name)
        .await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .context("Failed to serialize status report")?;
            println!("{}", json);
        }
        OutputFormat::Text => print_text_status(&report),
    }

    Ok(())
}

fn print_text_status(report: &StatusReport) {
    ui::print_header(&format!("📊 Status: {}", report.release));

    ui::print_field("Namespace", &report.namespace);
    ui::print_field("Build", &report.build_status.bright_yellow().to_string());

    let process = match &report.workload.process_status {
        ApplicationStatus::Reported(s) if s == "running" => s.bright_green().to_string(),
        other => other.as_str().bright_red().to_string(),
    };
    ui::print_field("Process", &process);

    let database = match report.workload.database_status {
        DatabaseStatus::Running => "running".bright_green().to_string(),
        DatabaseStatus::NotReady => "not_ready".bright_red().to_string(),
    };
    ui::print_field("Database", &database);

    ui::print_field(
        "Application pod",
        report.application_pod_status.as_deref().unwrap_or("-"),
    );
    ui::print_field(
        "Database pod",
        report.database_pod_status.as_deref().unwrap_or("-"),
    );
    println!();
}
