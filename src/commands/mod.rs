//! Command handlers
//!
//! Each handler loads nothing itself; it receives the already-validated
//! [`DeployConfig`] and builds the live orchestrator from it.

pub mod deploy;
pub mod restart;
pub mod status;

use anyhow::{Context, Result};

use crate::config::DeployConfig;
use crate::infrastructure::{HelmReleaseManager, KubeCluster};
use crate::k8s;
use crate::services::DeploymentOrchestrator;

pub type LiveOrchestrator = DeploymentOrchestrator<KubeCluster, HelmReleaseManager>;

/// Wire the kube and helm adapters for one mode
pub async fn build_orchestrator(config: &DeployConfig) -> Result<LiveOrchestrator> {
    let client = k8s::create_client(config).await?;
    let cluster = KubeCluster::new(client);
    let releases = HelmReleaseManager::from_config(config);

    DeploymentOrchestrator::from_config(cluster, releases, config)
        .context("Invalid orchestrator settings")
}
