use anyhow::Result;
use tracing::info;

use crate::commands::build_orchestrator;
use crate::config::DeployConfig;
use crate::ui;

/// Restart the application with optional module install/update
///
/// Every step is attempted; failed steps are listed and make the command
/// exit non-zero after the full log has been printed.
pub async fn execute(
    config: &DeployConfig,
    install: Option<String>,
    update: Option<String>,
) -> Result<()> {
    ui::print_header(&format!("Restart - {}", config.request.build_name));

    if let Some(modules) = &install {
        info!("📦 Installing modules: {}", modules);
    }
    if let Some(modules) = &update {
        info!("🔄 Updating modules: {}", modules);
    }

    let orchestrator = build_orchestrator(config).await?;
    let report = orchestrator
        .restart(
            &config.request.namespace,
            install.as_deref(),
            update.as_deref(),
        )
        .await;

    println!("{}", report.combined_log());
    println!();

    if report.is_clean() {
        ui::print_success("Restart sequence completed");
        return Ok(());
    }

    let failed = report.failed_steps();
    let names: Vec<&str> = failed.iter().map(|s| s.name()).collect();
    ui::print_error(&format!("Failed steps: {}", names.join(", ")));
    anyhow::bail!("{} of {} restart steps failed", failed.len(), report.steps.len())
}
