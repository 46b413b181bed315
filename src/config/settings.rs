//! Orchestrator settings loaded from the optional `deploy.yaml`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

/// How many instances of a workload a remote command is sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanOutPolicy {
    /// Only the first instance (sorted by name). Commands are not cluster-wide.
    #[default]
    First,
    /// Every instance, one after another
    All,
}

/// Upstream chart the release is built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSource {
    #[serde(default = "default_chart_name")]
    pub name: String,

    #[serde(default = "default_chart_version")]
    pub version: String,

    #[serde(default = "default_chart_repository")]
    pub repository: String,
}

fn default_chart_name() -> String {
    "odoo".to_string()
}

fn default_chart_version() -> String {
    "18.2.2".to_string()
}

fn default_chart_repository() -> String {
    "https://charts.bitnami.com/bitnami".to_string()
}

impl Default for ChartSource {
    fn default() -> Self {
        Self {
            name: default_chart_name(),
            version: default_chart_version(),
            repository: default_chart_repository(),
        }
    }
}

/// Behavioural settings for the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorSettings {
    #[serde(default)]
    pub exec_fan_out: FanOutPolicy,

    /// Label value of the application workload (default: "odoo")
    #[serde(default = "default_application_workload")]
    pub application_workload: String,

    /// Label value of the database workload (default: "postgresql")
    #[serde(default = "default_database_workload")]
    pub database_workload: String,

    /// Label key used to select workload instances
    #[serde(default = "default_instance_label_key")]
    pub instance_label_key: String,

    #[serde(default)]
    pub chart: ChartSource,

    /// Helm operation timeout, humantime format (e.g. "10m", "90s")
    #[serde(default = "default_helm_timeout")]
    pub helm_timeout: String,

    /// Override for the cluster API server URL
    #[serde(default)]
    pub kube_endpoint: Option<String>,
}

fn default_application_workload() -> String {
    "odoo".to_string()
}

fn default_database_workload() -> String {
    "postgresql".to_string()
}

fn default_instance_label_key() -> String {
    "app.kubernetes.io/name".to_string()
}

fn default_helm_timeout() -> String {
    "10m".to_string()
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            exec_fan_out: FanOutPolicy::default(),
            application_workload: default_application_workload(),
            database_workload: default_database_workload(),
            instance_label_key: default_instance_label_key(),
            chart: ChartSource::default(),
            helm_timeout: default_helm_timeout(),
            kube_endpoint: None,
        }
    }
}

impl OrchestratorSettings {
    /// Parsed helm timeout
    pub fn helm_timeout(&self) -> Result<Duration, ConfigError> {
        humantime::parse_duration(&self.helm_timeout).map_err(|e| ConfigError::InvalidValue {
            field: "helm_timeout".to_string(),
            value: format!("{} ({})", self.helm_timeout, e),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.helm_timeout()?;

        for (field, value) in [
            ("application_workload", &self.application_workload),
            ("database_workload", &self.database_workload),
            ("instance_label_key", &self.instance_label_key),
        ] {
            if value.is_empty() {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                });
            }
        }

        Ok(())
    }
}
