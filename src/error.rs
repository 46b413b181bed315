//! Centralized error types for chartwright
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use thiserror::Error;

/// Top-level error type for lifecycle operations
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Cluster error: {0}")]
    Cluster(#[from] ClusterError),

    #[error("Release manager error: {0}")]
    Release(#[from] ReleaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The existence query failed, so install vs. upgrade cannot be decided.
    #[error("Could not determine state of release {release} in namespace {namespace}: {source}")]
    ReleaseQuery {
        release: String,
        namespace: String,
        #[source]
        source: ReleaseError,
    },

    #[error("Secret {name} in namespace {namespace} has no field '{field}'")]
    SecretFieldMissing {
        name: String,
        namespace: String,
        field: String,
    },

    #[error("Secret {name} field '{field}' is not valid UTF-8")]
    SecretNotUtf8 { name: String, field: String },
}

/// Cluster API errors
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("{kind} {name} not found in namespace {namespace}")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    #[error("No running instances match '{selector}' in namespace {namespace}")]
    NoInstances { namespace: String, selector: String },

    #[error("Kubernetes API request failed: {0}")]
    Transport(#[from] kube::Error),

    #[error("Command execution in {instance} failed: {message}")]
    Exec { instance: String, message: String },
}

impl ClusterError {
    /// Whether this error means the requested object does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Transport(kube::Error::Api(response)) => response.code == 404,
            _ => false,
        }
    }
}

/// Release manager (helm) errors
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Failed to parse release listing: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to prepare chart workspace: {message}")]
    Workspace { message: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Required configuration missing: {field}")]
    MissingField { field: String },

    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse config {path}: {message}")]
    ParseError { path: String, message: String },
}
