//! # Deployment Configuration
//!
//! Everything is loaded from one per-mode directory, `{config_dir}/{mode}/`:
//!
//! 1. **`build-params.json`** (required) - the [`DeploymentRequest`]
//! 2. **`ssl-key`, `ssl-cert`** (required for install/upgrade) - TLS material for the ingress
//! 3. **`kube.yaml`** (optional) - kubeconfig for the kube client and helm
//! 4. **`deploy.yaml`** (optional) - [`OrchestratorSettings`] overrides
//!
//! The resulting [`DeployConfig`] is handed to every component constructor;
//! nothing reads the mode from ambient state.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! let config = DeployConfig::load(Path::new("config"), "production", TlsRequirement::Required)?;
//! println!("Namespace: {}", config.request.namespace);
//! ```

mod request;
mod settings;

pub use request::DeploymentRequest;
pub use settings::{ChartSource, FanOutPolicy, OrchestratorSettings};

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ConfigError;

pub const BUILD_PARAMS_FILE: &str = "build-params.json";
pub const KUBECONFIG_FILE: &str = "kube.yaml";
pub const SETTINGS_FILE: &str = "deploy.yaml";
pub const TLS_KEY_FILE: &str = "ssl-key";
pub const TLS_CERT_FILE: &str = "ssl-cert";

/// PEM key and certificate served by the ingress
#[derive(Clone, PartialEq, Eq)]
pub struct TlsMaterial {
    pub key: String,
    pub certificate: String,
}

impl std::fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsMaterial")
            .field("key", &"<redacted>")
            .field("certificate_len", &self.certificate.len())
            .finish()
    }
}

impl TlsMaterial {
    /// Read `ssl-key` and `ssl-cert` from a mode directory
    pub fn load(mode_dir: &Path) -> Result<Self, ConfigError> {
        Ok(Self {
            key: read_required(&mode_dir.join(TLS_KEY_FILE))?,
            certificate: read_required(&mode_dir.join(TLS_CERT_FILE))?,
        })
    }
}

/// Whether a command needs the ingress TLS material
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsRequirement {
    /// Install and upgrade render values that embed the key and certificate
    Required,
    /// Status and restart never render values; the files are not read
    NotNeeded,
}

/// Complete configuration for one deployment mode
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Deployment mode (e.g. "development", "production")
    pub mode: String,

    pub request: DeploymentRequest,

    /// Present when loaded with [`TlsRequirement::Required`]
    pub tls: Option<TlsMaterial>,

    pub settings: OrchestratorSettings,

    /// Credentials path, when a kubeconfig is present in the mode directory
    pub kubeconfig: Option<PathBuf>,
}

impl DeployConfig {
    /// Load and validate configuration for a mode
    ///
    /// # Errors
    /// Fails before any cluster call when `build-params.json` is missing,
    /// when the TLS files are missing but required, or when any file is malformed.
    pub fn load(
        config_dir: &Path,
        mode: &str,
        tls_requirement: TlsRequirement,
    ) -> Result<Self, ConfigError> {
        let mode_dir = config_dir.join(mode);
        debug!("Loading {} configuration from {}", mode, mode_dir.display());

        let request_path = mode_dir.join(BUILD_PARAMS_FILE);
        let content = read_required(&request_path)?;
        let request: DeploymentRequest =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: request_path.display().to_string(),
                message: e.to_string(),
            })?;
        request.validate()?;

        let tls = match tls_requirement {
            TlsRequirement::Required => Some(TlsMaterial::load(&mode_dir)?),
            TlsRequirement::NotNeeded => None,
        };

        let settings_path = mode_dir.join(SETTINGS_FILE);
        let settings: OrchestratorSettings = if settings_path.exists() {
            let content = read_required(&settings_path)?;
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: settings_path.display().to_string(),
                message: e.to_string(),
            })?
        } else {
            OrchestratorSettings::default()
        };
        settings.validate()?;

        let kubeconfig_path = mode_dir.join(KUBECONFIG_FILE);
        let kubeconfig = kubeconfig_path.exists().then_some(kubeconfig_path);

        Ok(Self {
            mode: mode.to_string(),
            request,
            tls,
            settings,
            kubeconfig,
        })
    }
}

fn read_required(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        },
    })
}
