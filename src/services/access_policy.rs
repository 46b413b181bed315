//! Access policy provisioning
//!
//! Grants the namespace's default service account the `anyuid` security
//! context constraint. Create-if-absent only; bindings are never updated or
//! deleted. Failures are reported as [`ProvisionWarning`]s because some
//! clusters neither support nor need the grant.

use k8s_openapi::api::rbac::v1::{RoleBinding, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::ProvisionWarning;
use crate::infrastructure::ClusterApi;

pub const ANYUID_BINDING: &str = "system:openshift:scc:anyuid";
const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";
const DEFAULT_SERVICE_ACCOUNT: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingOutcome {
    AlreadyPresent,
    Created,
    /// Lookup or creation failed; the install carries on
    Skipped(ProvisionWarning),
}

impl BindingOutcome {
    pub fn into_warning(self) -> Option<ProvisionWarning> {
        match self {
            Self::Skipped(warning) => Some(warning),
            _ => None,
        }
    }
}

/// Binding of the `anyuid` cluster role to the namespace's default service account
pub fn anyuid_binding(namespace: &str) -> RoleBinding {
    RoleBinding {
        metadata: ObjectMeta {
            name: Some(ANYUID_BINDING.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        role_ref: RoleRef {
            api_group: RBAC_API_GROUP.to_string(),
            kind: "ClusterRole".to_string(),
            name: ANYUID_BINDING.to_string(),
        },
        subjects: Some(vec![Subject {
            kind: "ServiceAccount".to_string(),
            name: DEFAULT_SERVICE_ACCOUNT.to_string(),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        }]),
    }
}

pub struct AccessPolicyProvisioner<C> {
    cluster: Arc<C>,
}

impl<C: ClusterApi> AccessPolicyProvisioner<C> {
    pub fn new(cluster: Arc<C>) -> Self {
        Self { cluster }
    }

    /// Ensure the binding exists in `namespace`. Never fails.
    pub async fn ensure_access_binding(&self, namespace: &str) -> BindingOutcome {
        let skipped = |message: String| {
            let warning = ProvisionWarning {
                namespace: namespace.to_string(),
                binding: ANYUID_BINDING.to_string(),
                message,
            };
            warn!("⚠️  {}", warning);
            BindingOutcome::Skipped(warning)
        };

        match self.cluster.get_role_binding(namespace, ANYUID_BINDING).await {
            Ok(_) => return BindingOutcome::AlreadyPresent,
            Err(e) if e.is_not_found() => {
                info!("Role binding not found in {}. Creating one...", namespace);
            }
            Err(e) => return skipped(format!("lookup failed: {}", e)),
        }

        match self
            .cluster
            .create_role_binding(namespace, &anyuid_binding(namespace))
            .await
        {
            Ok(()) => {
                info!("✅ Created role binding {} in {}", ANYUID_BINDING, namespace);
                BindingOutcome::Created
            }
            Err(e) => skipped(format!("creation failed: {}", e)),
        }
    }
}
