//! Desired-state values for the application chart.
//!
//! Built fresh from a [`DeploymentRequest`] on every orchestration call and
//! only mutated afterwards to re-inject persisted credentials.

use serde_json::{json, Map, Value};

use crate::config::{DeploymentRequest, TlsMaterial};

/// Top-level key holding the application admin password
pub const APPLICATION_PASSWORD_KEY: &str = "odooPassword";
/// Nested section configuring the bundled database
pub const DATABASE_SECTION: &str = "postgresql";
/// Key of the database password inside [`DATABASE_SECTION`]
pub const DATABASE_PASSWORD_KEY: &str = "postgresqlPassword";

const INSTANCE_LABEL: &str = "app.kubernetes.io/instance";
const HOSTNAME_TOPOLOGY: &str = "kubernetes.io/hostname";

/// Structured values document for one release
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredValues(Map<String, Value>);

impl DesiredValues {
    /// Derive values from a request plus the static scheduling and ingress policy
    pub fn from_request(request: &DeploymentRequest, tls: &TlsMaterial) -> Self {
        let mut values = Map::new();

        values.insert(
            "image".to_string(),
            json!({
                "registry": request.registry,
                "repository": request.repository,
                "tag": request.image_tag,
                "pullPolicy": "Always",
            }),
        );
        values.insert("odooUsername".to_string(), json!(request.admin_username));
        values.insert("odooEmail".to_string(), json!(request.admin_username));
        values.insert("service".to_string(), json!({ "type": "ClusterIP" }));
        values.insert(
            "ingress".to_string(),
            json!({
                "enabled": true,
                "hostname": request.build_domain,
                "tls": true,
                "secrets": [{
                    "name": format!("{}-tls", request.build_domain),
                    "key": tls.key,
                    "certificate": tls.certificate,
                }],
            }),
        );
        // Instances of one release land on distinct hosts
        values.insert(
            "affinity".to_string(),
            json!({
                "podAntiAffinity": {
                    "requiredDuringSchedulingIgnoredDuringExecution": [{
                        "labelSelector": {
                            "matchExpressions": [{
                                "key": INSTANCE_LABEL,
                                "operator": "In",
                                "values": [request.build_name],
                            }],
                        },
                        "topologyKey": HOSTNAME_TOPOLOGY,
                    }],
                },
            }),
        );
        values.insert(
            "resources".to_string(),
            json!({
                "requests": { "memory": "512Mi", "cpu": "250m" },
                "limits": { "memory": request.max_memory, "cpu": request.max_cpu },
            }),
        );

        if let Some(storage_class) = request.storage_class() {
            values.insert(
                "persistence".to_string(),
                json!({ "storageClass": storage_class }),
            );
            values.insert(
                DATABASE_SECTION.to_string(),
                json!({ "persistence": { "storageClass": storage_class } }),
            );
        }

        if let Some(smtp) = request.smtp() {
            values.insert("smtpHost".to_string(), json!(smtp.host));
            values.insert("smtpPort".to_string(), json!(smtp.port));
            values.insert("smtpUser".to_string(), json!(smtp.user));
            values.insert("smtpPassword".to_string(), json!(smtp.password));
            values.insert("smtpProtocol".to_string(), json!(smtp.protocol));
        }

        Self(values)
    }

    pub fn set_application_password(&mut self, password: &str) {
        self.0
            .insert(APPLICATION_PASSWORD_KEY.to_string(), json!(password));
    }

    /// Set the database password, creating the database section if absent
    pub fn set_database_password(&mut self, password: &str) {
        let section = self
            .0
            .entry(DATABASE_SECTION.to_string())
            .or_insert_with(|| Value::Object(Map::new()));

        if !section.is_object() {
            *section = Value::Object(Map::new());
        }
        if let Value::Object(section) = section {
            section.insert(DATABASE_PASSWORD_KEY.to_string(), json!(password));
        }
    }

    #[cfg(test)]
    pub fn application_password(&self) -> Option<&str> {
        self.0.get(APPLICATION_PASSWORD_KEY).and_then(Value::as_str)
    }

    #[cfg(test)]
    pub fn database_password(&self) -> Option<&str> {
        self.0
            .get(DATABASE_SECTION)
            .and_then(|s| s.get(DATABASE_PASSWORD_KEY))
            .and_then(Value::as_str)
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Values for an umbrella chart, nested under the dependency name
    pub fn nested_under(&self, dependency: &str) -> Value {
        let mut wrapped = Map::new();
        wrapped.insert(dependency.to_string(), Value::Object(self.0.clone()));
        Value::Object(wrapped)
    }
}
