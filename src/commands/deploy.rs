use anyhow::Result;
use colored::Colorize;
use tracing::info;

use crate::commands::build_orchestrator;
use crate::config::DeployConfig;
use crate::domain::{DeployOutcome, DeployReport};
use crate::ui;

/// Which lifecycle path the command takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployAction {
    /// Install when absent, upgrade when present
    Auto,
    Install,
    Upgrade,
}

impl DeployAction {
    fn title(&self) -> &'static str {
        match self {
            Self::Auto => "Deploy",
            Self::Install => "Install",
            Self::Upgrade => "Upgrade",
        }
    }
}

pub async fn execute(config: &DeployConfig, action: DeployAction) -> Result<()> {
    let request = &config.request;
    ui::print_header(&format!("{} - {}", action.title(), request.build_name));

    info!("🎯 Mode: {}", config.mode);
    info!("📦 Namespace: {}", request.namespace);
    info!("🌐 Domain: {}", request.build_domain);
    println!();

    let orchestrator = build_orchestrator(config).await?;

    let spinner = ui::spinner(&format!("Running {} for {}...", action.title().to_lowercase(), request.build_name))?;
    let result = match action {
        DeployAction::Auto => orchestrator.install_or_upgrade(request).await,
        DeployAction::Install => orchestrator.install(request).await,
        DeployAction::Upgrade => orchestrator.upgrade(request).await,
    };
    spinner.finish_and_clear();

    let report = result?;
    print_report(&request.build_name, &report);
    Ok(())
}

fn print_report(build_name: &str, report: &DeployReport) {
    match report.outcome {
        DeployOutcome::Installed => ui::print_success(&format!("Installed {}", build_name)),
        DeployOutcome::Upgraded => ui::print_success(&format!("Upgraded {}", build_name)),
        DeployOutcome::AlreadyInstalled => {
            ui::print_info(&format!("Already installed: {}", build_name))
        }
        DeployOutcome::NotFound => ui::print_warning(&format!("Build not found: {}", build_name)),
    }

    for warning in &report.warnings {
        ui::print_warning(&format!("{}", warning));
    }

    println!();
    println!("  Outcome: {}", report.outcome.as_str().bright_white().bold());
}
