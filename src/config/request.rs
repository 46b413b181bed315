//! Deployment request loaded from `build-params.json`.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Desired deployment, immutable for the duration of one orchestration call.
///
/// `namespace` and `build_name` identify the release; changing either one
/// addresses a different, unrelated deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRequest {
    pub namespace: String,

    /// Release name
    pub build_name: String,

    /// Public hostname served by the ingress
    pub build_domain: String,

    /// Administrator login (also used as the admin email)
    #[serde(default = "default_admin_username", alias = "odoo_username")]
    pub admin_username: String,

    #[serde(default = "default_registry", alias = "app_registry")]
    pub registry: String,

    #[serde(default = "default_repository", alias = "app_repository")]
    pub repository: String,

    #[serde(default = "default_image_tag", alias = "app_version")]
    pub image_tag: String,

    #[serde(default = "default_max_cpu")]
    pub max_cpu: String,

    #[serde(default = "default_max_memory")]
    pub max_memory: String,

    #[serde(default)]
    pub storage_class: Option<String>,

    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default)]
    pub smtp_port: Option<String>,
    #[serde(default)]
    pub smtp_user: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    #[serde(default)]
    pub smtp_protocol: Option<String>,
}

/// Outbound mail settings, present only when a host is configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: String,
    pub protocol: String,
}

fn default_admin_username() -> String {
    "admin@pappaya.com".to_string()
}

fn default_registry() -> String {
    "registry.pappayacloud.com:5000".to_string()
}

fn default_repository() -> String {
    "pappayalite-crm".to_string()
}

fn default_image_tag() -> String {
    "latest".to_string()
}

fn default_max_cpu() -> String {
    "1000m".to_string()
}

fn default_max_memory() -> String {
    "2024Mi".to_string()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
impl DeploymentRequest {
    /// Create a request with defaults for everything but the identity fields
    pub fn new(
        namespace: impl Into<String>,
        build_name: impl Into<String>,
        build_domain: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            build_name: build_name.into(),
            build_domain: build_domain.into(),
            admin_username: default_admin_username(),
            registry: default_registry(),
            repository: default_repository(),
            image_tag: default_image_tag(),
            max_cpu: default_max_cpu(),
            max_memory: default_max_memory(),
            storage_class: None,
            smtp_host: None,
            smtp_port: None,
            smtp_user: None,
            smtp_password: None,
            smtp_protocol: None,
        }
    }

    /// Builder: set storage class for application and database volumes
    pub fn with_storage_class(mut self, storage_class: impl Into<String>) -> Self {
        self.storage_class = Some(storage_class.into());
        self
    }
}

impl DeploymentRequest {
    /// Storage class, treating an empty string as unset
    pub fn storage_class(&self) -> Option<&str> {
        non_empty(&self.storage_class)
    }

    /// SMTP settings, only when a host is configured
    pub fn smtp(&self) -> Option<SmtpSettings> {
        let host = non_empty(&self.smtp_host)?;
        let field = |v: &Option<String>| v.clone().unwrap_or_default();
        Some(SmtpSettings {
            host: host.to_string(),
            port: field(&self.smtp_port),
            user: field(&self.smtp_user),
            password: field(&self.smtp_password),
            protocol: field(&self.smtp_protocol),
        })
    }

    /// Reject requests that cannot identify a deployment
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("namespace", &self.namespace),
            ("build_name", &self.build_name),
            ("build_domain", &self.build_domain),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                });
            }
        }

        Ok(())
    }
}
