//! Helm release manager
//!
//! Releases are built from a generated umbrella chart: a temp workspace with a
//! `Chart.yaml` depending on the upstream chart and a `values.yaml` carrying
//! the desired values under the dependency's name.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use super::ReleaseManager;
use crate::config::DeployConfig;
use crate::domain::{DesiredValues, ReleaseInfo, ReleaseOptions};
use crate::error::ReleaseError;
use crate::tools::{get_tool_path, tools};

const UMBRELLA_API_VERSION: &str = "v2";
const UMBRELLA_VERSION: &str = "0.1.0";

/// [`ReleaseManager`] that shells out to `helm`
pub struct HelmReleaseManager {
    helm_bin: String,
    kubeconfig: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct HelmListEntry {
    name: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UmbrellaChart<'a> {
    api_version: &'static str,
    name: &'a str,
    version: &'static str,
    app_version: &'a str,
    dependencies: Vec<ChartDependency<'a>>,
}

#[derive(Debug, Serialize)]
struct ChartDependency<'a> {
    name: &'a str,
    version: &'a str,
    repository: &'a str,
}

impl HelmReleaseManager {
    pub fn new(kubeconfig: Option<PathBuf>) -> Self {
        Self {
            helm_bin: get_tool_path(tools::HELM),
            kubeconfig,
        }
    }

    pub fn from_config(config: &DeployConfig) -> Self {
        Self::new(config.kubeconfig.clone())
    }

    async fn run(&self, mut args: Vec<String>) -> Result<String, ReleaseError> {
        if let Some(path) = &self.kubeconfig {
            args.push(format!("--kubeconfig={}", path.display()));
        }

        let command = format!("{} {}", self.helm_bin, args.first().map(String::as_str).unwrap_or(""));
        debug!("Running {} {}", self.helm_bin, args.join(" "));

        let output = Command::new(&self.helm_bin)
            .args(&args)
            .output()
            .await
            .map_err(|source| ReleaseError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ReleaseError::CommandFailed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn apply(
        &self,
        verb: &str,
        release: &ReleaseInfo,
        values: &DesiredValues,
        options: &ReleaseOptions,
    ) -> Result<(), ReleaseError> {
        let (_tmpdir, chart_path) = prepare_chart_workspace(release, values)?;

        info!(
            "helm {} {} (chart {} {}) in {}",
            verb, release.name, release.chart.name, release.chart.version, release.namespace
        );

        let output = self
            .run(release_args(verb, release, &chart_path, options))
            .await?;
        debug!("{}", output.trim());
        Ok(())
    }
}

/// Build `helm install|upgrade` arguments
fn release_args(
    verb: &str,
    release: &ReleaseInfo,
    chart_path: &Path,
    options: &ReleaseOptions,
) -> Vec<String> {
    let mut args = vec![
        verb.to_string(),
        release.name.clone(),
        chart_path.display().to_string(),
        "--namespace".to_string(),
        release.namespace.clone(),
        "--values".to_string(),
        chart_path.join("values.yaml").display().to_string(),
    ];
    args.extend(options.to_args());
    args
}

/// Find a release's status in `helm list --output json` output
fn parse_release_status(listing: &str, release: &str) -> Result<Option<String>, ReleaseError> {
    let trimmed = listing.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let entries: Vec<HelmListEntry> = serde_json::from_str(trimmed)?;
    Ok(entries
        .into_iter()
        .find(|e| e.name == release)
        .map(|e| e.status))
}

fn workspace_error(e: impl std::fmt::Display) -> ReleaseError {
    ReleaseError::Workspace {
        message: e.to_string(),
    }
}

/// Write the umbrella chart into a fresh temp directory.
///
/// Returns (temp_dir, chart_path_inside_temp); the chart lives as long as the TempDir.
fn prepare_chart_workspace(
    release: &ReleaseInfo,
    values: &DesiredValues,
) -> Result<(tempfile::TempDir, PathBuf), ReleaseError> {
    let tmpdir = tempfile::tempdir().map_err(workspace_error)?;
    let chart_path = tmpdir.path().join(&release.name);
    std::fs::create_dir_all(&chart_path).map_err(workspace_error)?;

    let chart = UmbrellaChart {
        api_version: UMBRELLA_API_VERSION,
        name: &release.name,
        version: UMBRELLA_VERSION,
        app_version: &release.app_version,
        dependencies: vec![ChartDependency {
            name: &release.chart.name,
            version: &release.chart.version,
            repository: &release.chart.repository,
        }],
    };

    let chart_yaml = serde_yaml::to_string(&chart).map_err(workspace_error)?;
    std::fs::write(chart_path.join("Chart.yaml"), chart_yaml).map_err(workspace_error)?;

    let values_yaml = serde_yaml::to_string(&values.nested_under(&release.chart.name))
        .map_err(workspace_error)?;
    std::fs::write(chart_path.join("values.yaml"), values_yaml).map_err(workspace_error)?;

    Ok((tmpdir, chart_path))
}

#[async_trait]
impl ReleaseManager for HelmReleaseManager {
    async fn status(&self, namespace: &str, release: &str) -> Result<Option<String>, ReleaseError> {
        let listing = self
            .run(vec![
                "list".to_string(),
                "--namespace".to_string(),
                namespace.to_string(),
                "--all".to_string(),
                "--filter".to_string(),
                format!("^{}$", release.replace('.', "\\.")),
                "--output".to_string(),
                "json".to_string(),
            ])
            .await?;

        parse_release_status(&listing, release)
    }

    async fn create(
        &self,
        release: &ReleaseInfo,
        values: &DesiredValues,
        options: &ReleaseOptions,
    ) -> Result<(), ReleaseError> {
        self.apply("install", release, values, options).await
    }

    async fn upgrade(
        &self,
        release: &ReleaseInfo,
        values: &DesiredValues,
        options: &ReleaseOptions,
    ) -> Result<(), ReleaseError> {
        self.apply("upgrade", release, values, options).await
    }
}
