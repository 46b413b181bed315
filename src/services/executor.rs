//! Remote command execution inside workload instances

use std::sync::Arc;
use tracing::debug;

use crate::config::{FanOutPolicy, OrchestratorSettings};
use crate::error::ClusterError;
use crate::infrastructure::ClusterApi;
use crate::k8s::workload_selector;

/// Workload roles the orchestrator talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadRole {
    Application,
    Database,
}

/// Runs shell commands in instances of a workload role
///
/// With [`FanOutPolicy::First`] only the first instance (by name) is
/// contacted, so callers must not assume a cluster-wide effect.
pub struct RemoteExecutor<C> {
    cluster: Arc<C>,
    label_key: String,
    application_workload: String,
    database_workload: String,
    fan_out: FanOutPolicy,
}

impl<C: ClusterApi> RemoteExecutor<C> {
    pub fn new(cluster: Arc<C>, settings: &OrchestratorSettings) -> Self {
        Self {
            cluster,
            label_key: settings.instance_label_key.clone(),
            application_workload: settings.application_workload.clone(),
            database_workload: settings.database_workload.clone(),
            fan_out: settings.exec_fan_out,
        }
    }

    pub fn selector(&self, role: WorkloadRole) -> String {
        let workload = match role {
            WorkloadRole::Application => &self.application_workload,
            WorkloadRole::Database => &self.database_workload,
        };
        workload_selector(&self.label_key, workload)
    }

    /// Lowercased phase of the first instance, if any
    pub async fn instance_phase(
        &self,
        namespace: &str,
        role: WorkloadRole,
    ) -> Result<Option<String>, ClusterError> {
        let instances = self
            .cluster
            .list_instances(namespace, &self.selector(role))
            .await?;
        Ok(instances.first().map(|i| i.phase.to_lowercase()))
    }

    /// Execute `command` and return its trimmed output
    pub async fn execute(
        &self,
        namespace: &str,
        role: WorkloadRole,
        command: &str,
    ) -> Result<String, ClusterError> {
        let selector = self.selector(role);
        let instances = self.cluster.list_instances(namespace, &selector).await?;

        if instances.is_empty() {
            return Err(ClusterError::NoInstances {
                namespace: namespace.to_string(),
                selector,
            });
        }

        let targets = match self.fan_out {
            FanOutPolicy::First => &instances[..1],
            FanOutPolicy::All => &instances[..],
        };

        let mut outputs = Vec::with_capacity(targets.len());
        let mut failures = Vec::new();

        for instance in targets {
            match self.cluster.exec_in(namespace, instance, command).await {
                Ok(output) => {
                    debug!("[{}] {}", instance.name, output);
                    outputs.push(output);
                }
                Err(e) if targets.len() == 1 => return Err(e),
                Err(e) => failures.push(format!("{}: {}", instance.name, e)),
            }
        }

        if !failures.is_empty() {
            return Err(ClusterError::Exec {
                instance: selector,
                message: failures.join("; "),
            });
        }

        Ok(outputs.join("\n").trim().to_string())
    }
}
