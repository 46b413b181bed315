//! Deployment orchestrator - drives the release lifecycle
//!
//! ```text
//! absent  --install-->  present      (create + access binding)
//! present --upgrade-->  present      (merge stored secrets + atomic upgrade)
//! unknown             -> error       (never guesses install vs. upgrade)
//! ```
//!
//! Status and restart flows run independently of the release state.
//! Nothing here locks: two callers driving the same release concurrently
//! need external mutual exclusion.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::access_policy::AccessPolicyProvisioner;
use super::credentials::CredentialContinuity;
use super::executor::{RemoteExecutor, WorkloadRole};
use crate::config::{ChartSource, DeployConfig, DeploymentRequest, OrchestratorSettings, TlsMaterial};
use crate::domain::release::{DeployOutcome, DeployReport, ReleaseInfo, ReleaseOptions, ReleaseState};
use crate::domain::restart::{restart_plan, RestartReport};
use crate::domain::status::{
    application_status_command, interpret_application_status, interpret_database_status,
    ApplicationStatus, DatabaseStatus, StatusReport, WorkloadStatus, BUILD_NOT_FOUND,
    DATABASE_READY_COMMAND,
};
use crate::domain::DesiredValues;
use crate::error::{ConfigError, DeployError};
use crate::infrastructure::{ClusterApi, ReleaseManager};

pub struct DeploymentOrchestrator<C, R> {
    releases: R,
    executor: RemoteExecutor<C>,
    provisioner: AccessPolicyProvisioner<C>,
    credentials: CredentialContinuity<C>,
    /// Only the install and upgrade flows need it
    tls: Option<TlsMaterial>,
    chart: ChartSource,
    helm_timeout: Duration,
    application_workload: String,
}

impl<C: ClusterApi, R: ReleaseManager> DeploymentOrchestrator<C, R> {
    pub fn new(
        cluster: C,
        releases: R,
        settings: &OrchestratorSettings,
        tls: Option<TlsMaterial>,
    ) -> Result<Self, ConfigError> {
        let cluster = Arc::new(cluster);
        Ok(Self {
            releases,
            executor: RemoteExecutor::new(cluster.clone(), settings),
            provisioner: AccessPolicyProvisioner::new(cluster.clone()),
            credentials: CredentialContinuity::new(cluster, settings),
            tls,
            chart: settings.chart.clone(),
            helm_timeout: settings.helm_timeout()?,
            application_workload: settings.application_workload.clone(),
        })
    }

    pub fn from_config(cluster: C, releases: R, config: &DeployConfig) -> Result<Self, ConfigError> {
        Self::new(cluster, releases, &config.settings, config.tls.clone())
    }

    pub async fn release_state(&self, namespace: &str, release: &str) -> ReleaseState {
        let state = ReleaseState::from_query(self.releases.exists(namespace, release).await);
        debug!("Release {} in {} is {}", release, namespace, state.name());
        state
    }

    fn tls(&self) -> Result<&TlsMaterial, ConfigError> {
        self.tls.as_ref().ok_or_else(|| ConfigError::MissingField {
            field: "tls (ssl-key, ssl-cert)".to_string(),
        })
    }

    /// Route to install or upgrade based on whether the release exists
    pub async fn install_or_upgrade(
        &self,
        request: &DeploymentRequest,
    ) -> Result<DeployReport, DeployError> {
        request.validate()?;
        let tls = self.tls()?;

        match self.query_state(request).await? {
            ReleaseState::Absent => self.install_absent(request, tls).await,
            _ => self.upgrade_present(request, tls).await,
        }
    }

    /// Install path only; an existing release is reported, not touched
    pub async fn install(&self, request: &DeploymentRequest) -> Result<DeployReport, DeployError> {
        request.validate()?;
        let tls = self.tls()?;

        match self.query_state(request).await? {
            ReleaseState::Absent => self.install_absent(request, tls).await,
            _ => {
                info!("Already installed: {}", request.build_name);
                Ok(DeployReport::new(DeployOutcome::AlreadyInstalled))
            }
        }
    }

    /// Upgrade path only; a missing release is reported, not created
    pub async fn upgrade(&self, request: &DeploymentRequest) -> Result<DeployReport, DeployError> {
        request.validate()?;
        let tls = self.tls()?;

        match self.query_state(request).await? {
            ReleaseState::Absent => {
                info!("Build not found: {}", request.build_name);
                Ok(DeployReport::new(DeployOutcome::NotFound))
            }
            _ => self.upgrade_present(request, tls).await,
        }
    }

    /// Resolve the release state, surfacing a failed query as an error
    async fn query_state(&self, request: &DeploymentRequest) -> Result<ReleaseState, DeployError> {
        match self
            .release_state(&request.namespace, &request.build_name)
            .await
        {
            ReleaseState::Unknown(source) => Err(DeployError::ReleaseQuery {
                release: request.build_name.clone(),
                namespace: request.namespace.clone(),
                source,
            }),
            state => Ok(state),
        }
    }

    async fn install_absent(
        &self,
        request: &DeploymentRequest,
        tls: &TlsMaterial,
    ) -> Result<DeployReport, DeployError> {
        info!("Installing {} into {}...", request.build_name, request.namespace);

        let release = ReleaseInfo::for_request(request, &self.chart);
        let values = DesiredValues::from_request(request, tls);
        self.releases
            .create(&release, &values, &ReleaseOptions::install(self.helm_timeout))
            .await?;

        let mut report = DeployReport::new(DeployOutcome::Installed);
        if let Some(warning) = self
            .provisioner
            .ensure_access_binding(&request.namespace)
            .await
            .into_warning()
        {
            report = report.with_warning(warning);
        }

        Ok(report)
    }

    async fn upgrade_present(
        &self,
        request: &DeploymentRequest,
        tls: &TlsMaterial,
    ) -> Result<DeployReport, DeployError> {
        info!("Upgrading {} in {}...", request.build_name, request.namespace);

        let values = DesiredValues::from_request(request, tls);
        let values = self
            .credentials
            .merge_persisted_secrets(&request.namespace, &request.build_name, values)
            .await?;

        let release = ReleaseInfo::for_request(request, &self.chart);
        self.releases
            .upgrade(&release, &values, &ReleaseOptions::upgrade(self.helm_timeout))
            .await?;

        Ok(DeployReport::new(DeployOutcome::Upgraded))
    }

    /// Aggregate release, process and database status
    ///
    /// Command failures become `error` / `not_ready`; only the release
    /// manager query can fail the whole call.
    pub async fn check_status(
        &self,
        namespace: &str,
        release: &str,
    ) -> Result<StatusReport, DeployError> {
        let build_status = self
            .releases
            .status(namespace, release)
            .await?
            .unwrap_or_else(|| BUILD_NOT_FOUND.to_string());

        let process_status = match self
            .executor
            .execute(
                namespace,
                WorkloadRole::Application,
                &application_status_command(&self.application_workload),
            )
            .await
        {
            Ok(output) => interpret_application_status(&output),
            Err(e) => {
                warn!("Application status check failed: {}", e);
                ApplicationStatus::Error
            }
        };

        let database_status = match self
            .executor
            .execute(namespace, WorkloadRole::Database, DATABASE_READY_COMMAND)
            .await
        {
            Ok(output) => interpret_database_status(&output),
            Err(e) => {
                warn!("Database readiness check failed: {}", e);
                DatabaseStatus::NotReady
            }
        };

        Ok(StatusReport {
            namespace: namespace.to_string(),
            release: release.to_string(),
            build_status,
            workload: WorkloadStatus {
                process_status,
                database_status,
            },
            application_pod_status: self.pod_phase(namespace, WorkloadRole::Application).await,
            database_pod_status: self.pod_phase(namespace, WorkloadRole::Database).await,
        })
    }

    async fn pod_phase(&self, namespace: &str, role: WorkloadRole) -> Option<String> {
        match self.executor.instance_phase(namespace, role).await {
            Ok(phase) => phase,
            Err(e) => {
                warn!("Could not read {:?} pod phase: {}", role, e);
                None
            }
        }
    }

    /// Stop, chmod, migrate, chmod, start - every step runs regardless of failures
    pub async fn restart(
        &self,
        namespace: &str,
        install_modules: Option<&str>,
        update_modules: Option<&str>,
    ) -> RestartReport {
        let mut report = RestartReport::default();

        for command in restart_plan(&self.application_workload, install_modules, update_modules) {
            info!("Restart step: {}", command.step);
            let output = self
                .executor
                .execute(namespace, WorkloadRole::Application, &command.command)
                .await
                .map_err(|e| {
                    warn!("Restart step {} failed: {}", command.step, e);
                    e.to_string()
                });
            report.record(&command, output);
        }

        report
    }
}
