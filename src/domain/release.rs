//! Release domain types
//!
//! Models the install/upgrade lifecycle as a state machine over
//! [`ReleaseState`], plus the outcome and warning values it reports.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::config::{ChartSource, DeploymentRequest};
use crate::error::ReleaseError;

/// Identity and chart of a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub name: String,
    pub namespace: String,
    /// Recorded as the umbrella chart's appVersion
    pub app_version: String,
    pub chart: ChartSource,
}

impl ReleaseInfo {
    pub fn for_request(request: &DeploymentRequest, chart: &ChartSource) -> Self {
        Self {
            name: request.build_name.clone(),
            namespace: request.namespace.clone(),
            app_version: request.image_tag.clone(),
            chart: chart.clone(),
        }
    }
}

/// Classification of a named release, recomputed on every call
#[derive(Debug)]
pub enum ReleaseState {
    Absent,
    Present,
    /// The existence query itself failed
    Unknown(ReleaseError),
}

impl ReleaseState {
    pub fn from_query(result: Result<bool, ReleaseError>) -> Self {
        match result {
            Ok(true) => Self::Present,
            Ok(false) => Self::Absent,
            Err(e) => Self::Unknown(e),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Present => "present",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Flags passed to the release manager's create/upgrade operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseOptions {
    /// Create the target namespace if it does not exist
    pub create_namespace: bool,
    /// Resolve chart dependencies before applying
    pub dependency_update: bool,
    /// Roll back automatically if the operation fails
    pub atomic: bool,
    pub timeout: Option<Duration>,
}

impl ReleaseOptions {
    /// Options for a first install
    pub fn install(timeout: Duration) -> Self {
        Self {
            create_namespace: true,
            dependency_update: true,
            atomic: false,
            timeout: Some(timeout),
        }
    }

    /// Options for an upgrade of an existing release
    pub fn upgrade(timeout: Duration) -> Self {
        Self {
            create_namespace: false,
            dependency_update: true,
            atomic: true,
            timeout: Some(timeout),
        }
    }

    /// Render as helm command-line flags
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.create_namespace {
            args.push("--create-namespace".to_string());
        }
        if self.dependency_update {
            args.push("--dependency-update".to_string());
        }
        if self.atomic {
            args.push("--atomic".to_string());
        }
        if let Some(timeout) = self.timeout {
            // helm expects Go durations; whole seconds are always accepted
            args.push(format!("--timeout={}s", timeout.as_secs().max(1)));
        }
        args
    }
}

/// Terminal outcome of an install/upgrade call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployOutcome {
    Installed,
    Upgraded,
    AlreadyInstalled,
    NotFound,
}

impl DeployOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Installed => "installed",
            Self::Upgraded => "upgraded",
            Self::AlreadyInstalled => "already_installed",
            Self::NotFound => "not_found",
        }
    }
}

impl fmt::Display for DeployOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-fatal failure while provisioning the access binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionWarning {
    pub namespace: String,
    pub binding: String,
    pub message: String,
}

impl fmt::Display for ProvisionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "access binding {} in {} not provisioned: {}",
            self.binding, self.namespace, self.message
        )
    }
}

/// Outcome plus the warnings collected on the way
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    pub outcome: DeployOutcome,
    pub warnings: Vec<ProvisionWarning>,
}

impl DeployReport {
    pub fn new(outcome: DeployOutcome) -> Self {
        Self {
            outcome,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: ProvisionWarning) -> Self {
        self.warnings.push(warning);
        self
    }
}
