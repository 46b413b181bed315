//! Credential continuity across upgrades
//!
//! The values generator never knows the running passwords, so before every
//! upgrade the stored secrets are copied back into the desired values.
//! A missing secret fails the upgrade rather than rotating the credential.

use std::sync::Arc;
use tracing::info;

use crate::config::OrchestratorSettings;
use crate::domain::DesiredValues;
use crate::error::DeployError;
use crate::infrastructure::ClusterApi;

/// Secret object and field holding one workload's password
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
    pub name: String,
    pub field: String,
}

impl SecretRef {
    /// Chart convention: secret `<release>-<workload>`, field `<workload>-password`
    pub fn for_workload(release: &str, workload: &str) -> Self {
        Self {
            name: format!("{}-{}", release, workload),
            field: format!("{}-password", workload),
        }
    }
}

pub struct CredentialContinuity<C> {
    cluster: Arc<C>,
    application_workload: String,
    database_workload: String,
}

impl<C: ClusterApi> CredentialContinuity<C> {
    pub fn new(cluster: Arc<C>, settings: &OrchestratorSettings) -> Self {
        Self {
            cluster,
            application_workload: settings.application_workload.clone(),
            database_workload: settings.database_workload.clone(),
        }
    }

    async fn read_password(&self, namespace: &str, secret: &SecretRef) -> Result<String, DeployError> {
        let material = self.cluster.get_secret(namespace, &secret.name).await?;

        let bytes = material
            .get(&secret.field)
            .ok_or_else(|| DeployError::SecretFieldMissing {
                name: secret.name.clone(),
                namespace: namespace.to_string(),
                field: secret.field.clone(),
            })?;

        String::from_utf8(bytes.clone()).map_err(|_| DeployError::SecretNotUtf8 {
            name: secret.name.clone(),
            field: secret.field.clone(),
        })
    }

    /// Replace generated passwords in `values` with the stored ones
    pub async fn merge_persisted_secrets(
        &self,
        namespace: &str,
        release: &str,
        mut values: DesiredValues,
    ) -> Result<DesiredValues, DeployError> {
        let application = SecretRef::for_workload(release, &self.application_workload);
        let database = SecretRef::for_workload(release, &self.database_workload);

        let application_password = self.read_password(namespace, &application).await?;
        let database_password = self.read_password(namespace, &database).await?;

        values.set_application_password(&application_password);
        values.set_database_password(&database_password);

        info!(
            "Carried over credentials from {} and {}",
            application.name, database.name
        );
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeploymentRequest, TlsMaterial};
    use crate::testing::FakeCluster;

    fn values() -> DesiredValues {
        let request = DeploymentRequest::new("acme", "acme-crm", "crm.acme.test");
        let tls = TlsMaterial {
            key: "KEY".to_string(),
            certificate: "CERT".to_string(),
        };
        let mut values = DesiredValues::from_request(&request, &tls);
        values.set_application_password("generated-app");
        values
    }

    #[test]
    fn test_secret_ref_naming() {
        let secret = SecretRef::for_workload("acme-crm", "postgresql");
        assert_eq!(secret.name, "acme-crm-postgresql");
        assert_eq!(secret.field, "postgresql-password");
    }

    #[tokio::test]
    async fn test_stored_passwords_replace_generated() {
        let cluster = Arc::new(
            FakeCluster::default()
                .with_secret("acme", "acme-crm-odoo", "odoo-password", "stored-app")
                .with_secret("acme", "acme-crm-postgresql", "postgresql-password", "stored-db"),
        );
        let credentials = CredentialContinuity::new(cluster, &OrchestratorSettings::default());

        let merged = credentials
            .merge_persisted_secrets("acme", "acme-crm", values())
            .await
            .unwrap();

        assert_eq!(merged.application_password(), Some("stored-app"));
        assert_eq!(merged.database_password(), Some("stored-db"));
    }

    #[tokio::test]
    async fn test_missing_database_secret_is_fatal() {
        let cluster = Arc::new(
            FakeCluster::default().with_secret("acme", "acme-crm-odoo", "odoo-password", "stored-app"),
        );
        let credentials = CredentialContinuity::new(cluster, &OrchestratorSettings::default());

        let err = credentials
            .merge_persisted_secrets("acme", "acme-crm", values())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Cluster(ref e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn test_missing_field_is_fatal() {
        let cluster = Arc::new(
            FakeCluster::default()
                .with_secret("acme", "acme-crm-odoo", "admin-password", "x")
                .with_secret("acme", "acme-crm-postgresql", "postgresql-password", "stored-db"),
        );
        let credentials = CredentialContinuity::new(cluster, &OrchestratorSettings::default());

        let err = credentials
            .merge_persisted_secrets("acme", "acme-crm", values())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::SecretFieldMissing { ref field, .. } if field == "odoo-password"));
    }
}
