//! Restart sequence for the application workload.
//!
//! The sequence is not transactional: every step runs even when an earlier
//! one failed, and operators read the combined log to judge the result.

use std::fmt;

/// Install root of a nami-managed service in the image
fn service_root(service: &str) -> String {
    format!("/opt/bitnami/{}", service)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartStep {
    Stop,
    ResetPermissions,
    Migrate,
    Start,
}

impl RestartStep {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::ResetPermissions => "chmod",
            Self::Migrate => "migrate",
            Self::Start => "start",
        }
    }
}

impl fmt::Display for RestartStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One step of the plan and the shell command it runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartCommand {
    pub step: RestartStep,
    pub command: String,
}

fn module_list(modules: Option<&str>) -> Option<&str> {
    modules.map(str::trim).filter(|m| !m.is_empty())
}

/// Run the server's init entry point once and exit, optionally installing
/// and/or updating comma-separated module lists
pub fn migrate_command(
    service: &str,
    install_modules: Option<&str>,
    update_modules: Option<&str>,
) -> String {
    let root = service_root(service);
    let mut parts = vec![
        format!("{}/venv/bin/python", root),
        format!("{}/openerp-server", root),
        format!("--config '{}/openerp-server.conf'", root),
        "--stop-after-init".to_string(),
    ];

    if let Some(modules) = module_list(install_modules) {
        parts.push(format!("-i {}", modules));
    }
    if let Some(modules) = module_list(update_modules) {
        parts.push(format!("-u {}", modules));
    }

    parts.join(" ")
}

/// The fixed five-step plan for `service`: stop, chmod, migrate, chmod, start
pub fn restart_plan(
    service: &str,
    install_modules: Option<&str>,
    update_modules: Option<&str>,
) -> Vec<RestartCommand> {
    let chmod = format!("chmod -R 777 {}/data/", service_root(service));

    vec![
        RestartCommand {
            step: RestartStep::Stop,
            command: format!("nami stop {}", service),
        },
        RestartCommand {
            step: RestartStep::ResetPermissions,
            command: chmod.clone(),
        },
        RestartCommand {
            step: RestartStep::Migrate,
            command: migrate_command(service, install_modules, update_modules),
        },
        RestartCommand {
            step: RestartStep::ResetPermissions,
            command: chmod,
        },
        RestartCommand {
            step: RestartStep::Start,
            command: format!("nami start {}", service),
        },
    ]
}

/// Result of one executed step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: RestartStep,
    pub command: String,
    /// Command output, or the failure message
    pub output: Result<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestartReport {
    pub steps: Vec<StepOutcome>,
}

impl RestartReport {
    pub fn record(&mut self, command: &RestartCommand, output: Result<String, String>) {
        self.steps.push(StepOutcome {
            step: command.step,
            command: command.command.clone(),
            output,
        });
    }

    /// Every step's output in execution order, failures included as text
    pub fn combined_log(&self) -> String {
        self.steps
            .iter()
            .map(|s| match &s.output {
                Ok(output) => output.clone(),
                Err(message) => format!("[{} failed] {}", s.step, message),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn failed_steps(&self) -> Vec<RestartStep> {
        self.steps
            .iter()
            .filter(|s| s.output.is_err())
            .map(|s| s.step)
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.steps.iter().all(|s| s.output.is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_order_is_fixed() {
        let steps: Vec<_> = restart_plan("odoo", None, None).iter().map(|c| c.step).collect();
        assert_eq!(
            steps,
            vec![
                RestartStep::Stop,
                RestartStep::ResetPermissions,
                RestartStep::Migrate,
                RestartStep::ResetPermissions,
                RestartStep::Start,
            ]
        );
    }

    #[test]
    fn test_migrate_without_modules() {
        let command = migrate_command("odoo", None, Some(""));
        assert!(command.ends_with("--stop-after-init"));
        assert!(!command.contains(" -i "));
        assert!(!command.contains(" -u "));
    }

    #[test]
    fn test_migrate_with_modules() {
        let command = migrate_command("odoo", Some("sale,crm"), Some("base"));
        assert!(command.contains("--config '/opt/bitnami/odoo/openerp-server.conf'"));
        assert!(command.ends_with("--stop-after-init -i sale,crm -u base"));
    }

    #[test]
    fn test_plan_length_independent_of_modules() {
        assert_eq!(restart_plan("odoo", Some("sale"), Some("crm")).len(), 5);
        assert_eq!(restart_plan("odoo", None, None).len(), 5);
    }

    #[test]
    fn test_plan_follows_service_name() {
        let plan = restart_plan("openerp", None, None);
        assert_eq!(plan[0].command, "nami stop openerp");
        assert_eq!(plan[1].command, "chmod -R 777 /opt/bitnami/openerp/data/");
        assert!(plan[2].command.starts_with("/opt/bitnami/openerp/venv/bin/python"));
        assert_eq!(plan[4].command, "nami start openerp");
    }

    #[test]
    fn test_default_service_commands() {
        let plan = restart_plan("odoo", None, None);
        assert_eq!(plan[0].command, "nami stop odoo");
        assert_eq!(plan[1].command, "chmod -R 777 /opt/bitnami/odoo/data/");
        assert_eq!(plan[4].command, "nami start odoo");
    }

    #[test]
    fn test_combined_log_includes_failures() {
        let plan = restart_plan("odoo", None, None);
        let mut report = RestartReport::default();
        report.record(&plan[0], Ok("stopped".to_string()));
        report.record(&plan[1], Err("permission denied".to_string()));
        report.record(&plan[2], Ok("migrated".to_string()));

        assert_eq!(
            report.combined_log(),
            "stopped\n[chmod failed] permission denied\nmigrated"
        );
        assert_eq!(report.failed_steps(), vec![RestartStep::ResetPermissions]);
        assert!(!report.is_clean());
    }
}
