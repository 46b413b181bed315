//! Infrastructure layer - external I/O adapters
//!
//! This module contains all code that interacts with external systems:
//! - Kubernetes API (secrets, role bindings, pod exec)
//! - Helm (release listing, install, upgrade)
//!
//! Services depend on the [`ClusterApi`] and [`ReleaseManager`] traits so the
//! orchestration logic can run against in-memory fakes in tests.

pub mod cluster;
pub mod helm;

use async_trait::async_trait;
use k8s_openapi::api::rbac::v1::RoleBinding;
use std::collections::BTreeMap;

use crate::domain::{DesiredValues, ReleaseInfo, ReleaseOptions};
use crate::error::{ClusterError, ReleaseError};

// Re-export commonly used types
pub use cluster::KubeCluster;
pub use helm::HelmReleaseManager;

/// Decoded secret data, keyed by field name
pub type SecretMaterial = BTreeMap<String, Vec<u8>>;

/// A single running copy of a workload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceHandle {
    pub name: String,
    /// Pod phase as reported by the cluster (e.g. "Running")
    pub phase: String,
}

/// Typed access to the cluster objects the orchestrator touches
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Read a secret; `ClusterError::NotFound` when absent
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretMaterial, ClusterError>;

    /// Read a role binding; `ClusterError::NotFound` when absent
    async fn get_role_binding(&self, namespace: &str, name: &str)
        -> Result<RoleBinding, ClusterError>;

    async fn create_role_binding(
        &self,
        namespace: &str,
        binding: &RoleBinding,
    ) -> Result<(), ClusterError>;

    /// Instances matching a label selector, sorted by name
    async fn list_instances(
        &self,
        namespace: &str,
        selector: &str,
    ) -> Result<Vec<InstanceHandle>, ClusterError>;

    /// Run `command` through `/bin/sh -c` and return combined stdout/stderr
    async fn exec_in(
        &self,
        namespace: &str,
        instance: &InstanceHandle,
        command: &str,
    ) -> Result<String, ClusterError>;
}

/// Install/upgrade/query primitives over a named release
#[async_trait]
pub trait ReleaseManager: Send + Sync {
    /// Status of a release (e.g. "deployed"), `None` when it does not exist
    async fn status(&self, namespace: &str, release: &str) -> Result<Option<String>, ReleaseError>;

    async fn exists(&self, namespace: &str, release: &str) -> Result<bool, ReleaseError> {
        Ok(self.status(namespace, release).await?.is_some())
    }

    async fn create(
        &self,
        release: &ReleaseInfo,
        values: &DesiredValues,
        options: &ReleaseOptions,
    ) -> Result<(), ReleaseError>;

    /// Must leave the previous release intact when `options.atomic` is set
    async fn upgrade(
        &self,
        release: &ReleaseInfo,
        values: &DesiredValues,
        options: &ReleaseOptions,
    ) -> Result<(), ReleaseError>;
}
