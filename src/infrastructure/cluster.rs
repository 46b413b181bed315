//! Kubernetes adapter backed by kube-rs

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, Secret};
use k8s_openapi::api::rbac::v1::RoleBinding;
use kube::{
    api::{Api, AttachParams, ListParams, PostParams},
    Client,
};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use super::{ClusterApi, InstanceHandle, SecretMaterial};
use crate::error::ClusterError;
use crate::k8s;

/// [`ClusterApi`] over a connected, authenticated kube client
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn not_found_or(err: kube::Error, kind: &str, namespace: &str, name: &str) -> ClusterError {
    match err {
        kube::Error::Api(ref response) if response.code == 404 => ClusterError::NotFound {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        other => ClusterError::Transport(other),
    }
}

async fn read_stream<R: AsyncRead + Unpin>(reader: Option<R>) -> std::io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[async_trait]
impl ClusterApi for KubeCluster {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretMaterial, ClusterError> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = secrets
            .get(name)
            .await
            .map_err(|e| not_found_or(e, "Secret", namespace, name))?;

        // k8s-openapi decodes the base64 payload into raw bytes
        Ok(secret
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (key, value.0))
            .collect())
    }

    async fn get_role_binding(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<RoleBinding, ClusterError> {
        let bindings: Api<RoleBinding> = Api::namespaced(self.client.clone(), namespace);
        bindings
            .get(name)
            .await
            .map_err(|e| not_found_or(e, "RoleBinding", namespace, name))
    }

    async fn create_role_binding(
        &self,
        namespace: &str,
        binding: &RoleBinding,
    ) -> Result<(), ClusterError> {
        let bindings: Api<RoleBinding> = Api::namespaced(self.client.clone(), namespace);
        bindings.create(&PostParams::default(), binding).await?;
        Ok(())
    }

    async fn list_instances(
        &self,
        namespace: &str,
        selector: &str,
    ) -> Result<Vec<InstanceHandle>, ClusterError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let lp = ListParams::default().labels(selector);
        let pod_list = pods.list(&lp).await?;

        let mut instances: Vec<InstanceHandle> = pod_list
            .iter()
            .map(|pod| InstanceHandle {
                name: k8s::pod_name(pod),
                phase: k8s::pod_phase(pod),
            })
            .collect();

        // Sort by name
        instances.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(instances)
    }

    async fn exec_in(
        &self,
        namespace: &str,
        instance: &InstanceHandle,
        command: &str,
    ) -> Result<String, ClusterError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = AttachParams::default()
            .stdin(false)
            .stdout(true)
            .stderr(true);

        debug!("exec in {}/{}: {}", namespace, instance.name, command);

        let mut attached = pods
            .exec(&instance.name, vec!["/bin/sh", "-c", command], &params)
            .await?;

        let (stdout, stderr) = tokio::join!(
            read_stream(attached.stdout()),
            read_stream(attached.stderr())
        );
        let exec_error = |message: String| ClusterError::Exec {
            instance: instance.name.clone(),
            message,
        };
        let mut output = stdout.map_err(|e| exec_error(e.to_string()))?;
        output.push_str(&stderr.map_err(|e| exec_error(e.to_string()))?);

        attached.join().await.map_err(|e| exec_error(e.to_string()))?;

        Ok(output.trim().to_string())
    }
}
