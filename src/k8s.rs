use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Pod;
use kube::{
    config::{KubeConfigOptions, Kubeconfig},
    Client, Config,
};
use tracing::debug;

use crate::config::DeployConfig;

/// Create Kubernetes client
///
/// Uses the mode's `kube.yaml` when present, otherwise infers the
/// configuration from the environment. `kube_endpoint` overrides the server URL.
pub async fn create_client(deploy: &DeployConfig) -> Result<Client> {
    let mut config = match &deploy.kubeconfig {
        Some(path) => {
            debug!("Using kubeconfig {}", path.display());
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .context("Failed to load kubeconfig")?
        }
        None => Config::infer()
            .await
            .context("Failed to infer kubeconfig")?,
    };

    if let Some(endpoint) = &deploy.settings.kube_endpoint {
        config.cluster_url = endpoint
            .parse()
            .with_context(|| format!("Invalid kube_endpoint: {}", endpoint))?;
    }

    Client::try_from(config).context("Failed to create Kubernetes client")
}

/// Label selector for one workload role
pub fn workload_selector(label_key: &str, workload: &str) -> String {
    format!("{}={}", label_key, workload)
}

/// Pod name, or "unknown" for unnamed pods
pub fn pod_name(pod: &Pod) -> String {
    pod.metadata
        .name
        .clone()
        .unwrap_or_else(|| "unknown".to_string())
}

/// Pod phase, or "Unknown" when the status has not been populated
pub fn pod_phase(pod: &Pod) -> String {
    pod.status
        .as_ref()
        .and_then(|s| s.phase.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}
