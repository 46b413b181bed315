//! Status vocabulary and the interpreters that map diagnostic output onto it.

use serde::{Serialize, Serializer};
use std::fmt;

/// Reports the application process state; last word is the state
pub fn application_status_command(service: &str) -> String {
    format!("nami status {}", service)
}

/// Probes the database administrative port
pub const DATABASE_READY_COMMAND: &str = "pg_isready -U postgres -h 127.0.0.1 -p 5432";

const NOT_INSTALLED_MARKER: &str = "not fully installed";
const ERROR_MARKER: &str = "ERROR";
const ACCEPTING_MARKER: &str = "accepting connections";

/// Build status reported when the release does not exist
pub const BUILD_NOT_FOUND: &str = "not_found";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationStatus {
    NotInstalled,
    Error,
    /// Final word of the status tool's output, lowercased
    Reported(String),
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::NotInstalled => "not_installed",
            Self::Error => "error",
            Self::Reported(status) => status,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ApplicationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseStatus {
    Running,
    NotReady,
}

impl DatabaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::NotReady => "not_ready",
        }
    }
}

impl fmt::Display for DatabaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the output of [`application_status_command`]
///
/// Empty output carries no status word and is treated as an error.
pub fn interpret_application_status(raw: &str) -> ApplicationStatus {
    if raw.contains(NOT_INSTALLED_MARKER) {
        return ApplicationStatus::NotInstalled;
    }
    if raw.contains(ERROR_MARKER) {
        return ApplicationStatus::Error;
    }

    match raw.split_whitespace().last() {
        Some(word) => ApplicationStatus::Reported(word.to_lowercase()),
        None => ApplicationStatus::Error,
    }
}

/// Classify the output of [`DATABASE_READY_COMMAND`]
pub fn interpret_database_status(raw: &str) -> DatabaseStatus {
    if raw.contains(ACCEPTING_MARKER) {
        DatabaseStatus::Running
    } else {
        DatabaseStatus::NotReady
    }
}

/// Point-in-time health of the two workload processes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkloadStatus {
    pub process_status: ApplicationStatus,
    pub database_status: DatabaseStatus,
}

/// Aggregated status of a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub namespace: String,
    pub release: String,
    /// Release manager status (e.g. "deployed", "failed") or [`BUILD_NOT_FOUND`]
    pub build_status: String,
    #[serde(flatten)]
    pub workload: WorkloadStatus,
    /// Lowercased phase of the first application instance
    pub application_pod_status: Option<String>,
    /// Lowercased phase of the first database instance
    pub database_pod_status: Option<String>,
}
