//! In-memory fakes for the cluster and release manager seams.
//!
//! Clones share state, so a test can hand one clone to the orchestrator and
//! inspect the recorded calls through another.

use async_trait::async_trait;
use k8s_openapi::api::rbac::v1::RoleBinding;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::domain::{DesiredValues, ReleaseInfo, ReleaseOptions};
use crate::error::{ClusterError, ReleaseError};
use crate::infrastructure::{ClusterApi, InstanceHandle, ReleaseManager, SecretMaterial};

/// Ordered log of calls shared between fakes
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    fn record(&self, event: String) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Default)]
struct ClusterState {
    secrets: HashMap<(String, String), SecretMaterial>,
    bindings: HashSet<(String, String)>,
    fail_binding_lookup: bool,
    fail_binding_create: bool,
    binding_creates: usize,
    instances: HashMap<String, Vec<String>>,
    exec_outputs: HashMap<String, String>,
    exec_failures: HashSet<String>,
    instance_failures: HashSet<(String, String)>,
    exec_log: Vec<(String, String)>,
}

#[derive(Clone, Default)]
pub struct FakeCluster {
    state: Arc<Mutex<ClusterState>>,
    journal: Journal,
}

impl FakeCluster {
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    pub fn with_secret(self, namespace: &str, name: &str, field: &str, value: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .secrets
            .entry((namespace.to_string(), name.to_string()))
            .or_default()
            .insert(field.to_string(), value.as_bytes().to_vec());
        self
    }

    pub fn with_binding(self, namespace: &str, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .bindings
            .insert((namespace.to_string(), name.to_string()));
        self
    }

    /// Binding lookups fail with a 403 instead of answering
    pub fn with_failing_binding_lookup(self) -> Self {
        self.state.lock().unwrap().fail_binding_lookup = true;
        self
    }

    pub fn with_failing_binding_create(self) -> Self {
        self.state.lock().unwrap().fail_binding_create = true;
        self
    }

    /// Running instances for a selector
    pub fn with_instances(self, selector: &str, names: &[&str]) -> Self {
        self.state.lock().unwrap().instances.insert(
            selector.to_string(),
            names.iter().map(|n| n.to_string()).collect(),
        );
        self
    }

    pub fn with_exec_output(self, command: &str, output: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .exec_outputs
            .insert(command.to_string(), output.to_string());
        self
    }

    pub fn with_exec_failure(self, command: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .exec_failures
            .insert(command.to_string());
        self
    }

    /// `command` fails only on `instance`
    pub fn with_exec_failure_on(self, instance: &str, command: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .instance_failures
            .insert((instance.to_string(), command.to_string()));
        self
    }

    pub fn binding_creates(&self) -> usize {
        self.state.lock().unwrap().binding_creates
    }

    pub fn has_binding(&self, namespace: &str, name: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .bindings
            .contains(&(namespace.to_string(), name.to_string()))
    }

    /// Instance names commands were sent to, in order
    pub fn exec_targets(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.exec_log.iter().map(|(i, _)| i.clone()).collect()
    }

    /// Commands executed, in order
    pub fn exec_commands(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.exec_log.iter().map(|(_, c)| c.clone()).collect()
    }
}

fn not_found(kind: &str, namespace: &str, name: &str) -> ClusterError {
    ClusterError::NotFound {
        kind: kind.to_string(),
        namespace: namespace.to_string(),
        name: name.to_string(),
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretMaterial, ClusterError> {
        self.journal
            .record(format!("get_secret {}/{}", namespace, name));
        let state = self.state.lock().unwrap();
        state
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| not_found("Secret", namespace, name))
    }

    async fn get_role_binding(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<RoleBinding, ClusterError> {
        let state = self.state.lock().unwrap();
        if state.fail_binding_lookup {
            return Err(ClusterError::Transport(kube::Error::Api(
                kube::error::ErrorResponse {
                    status: "Failure".to_string(),
                    message: "rolebindings is forbidden".to_string(),
                    reason: "Forbidden".to_string(),
                    code: 403,
                },
            )));
        }
        if state
            .bindings
            .contains(&(namespace.to_string(), name.to_string()))
        {
            Ok(crate::services::access_policy::anyuid_binding(namespace))
        } else {
            Err(not_found("RoleBinding", namespace, name))
        }
    }

    async fn create_role_binding(
        &self,
        namespace: &str,
        binding: &RoleBinding,
    ) -> Result<(), ClusterError> {
        self.journal
            .record(format!("create_role_binding {}", namespace));
        let mut state = self.state.lock().unwrap();
        if state.fail_binding_create {
            return Err(ClusterError::Exec {
                instance: "rbac".to_string(),
                message: "forbidden".to_string(),
            });
        }
        state.binding_creates += 1;
        let name = binding.metadata.name.clone().unwrap_or_default();
        state.bindings.insert((namespace.to_string(), name));
        Ok(())
    }

    async fn list_instances(
        &self,
        _namespace: &str,
        selector: &str,
    ) -> Result<Vec<InstanceHandle>, ClusterError> {
        let state = self.state.lock().unwrap();
        let mut instances: Vec<InstanceHandle> = state
            .instances
            .get(selector)
            .map(|names| {
                names
                    .iter()
                    .map(|name| InstanceHandle {
                        name: name.clone(),
                        phase: "Running".to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        instances.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(instances)
    }

    async fn exec_in(
        &self,
        _namespace: &str,
        instance: &InstanceHandle,
        command: &str,
    ) -> Result<String, ClusterError> {
        let mut state = self.state.lock().unwrap();
        state
            .exec_log
            .push((instance.name.clone(), command.to_string()));

        let failing_here = state
            .instance_failures
            .contains(&(instance.name.clone(), command.to_string()));
        if failing_here || state.exec_failures.contains(command) {
            return Err(ClusterError::Exec {
                instance: instance.name.clone(),
                message: "command terminated with exit code 1".to_string(),
            });
        }

        Ok(state
            .exec_outputs
            .get(command)
            .cloned()
            .unwrap_or_default()
            .trim()
            .to_string())
    }
}

#[derive(Default)]
struct ReleaseState {
    releases: BTreeMap<(String, String), String>,
    fail_query: bool,
    fail_upgrade: bool,
    queries: usize,
    creates: usize,
    upgrades: usize,
    last_values: Option<DesiredValues>,
    last_options: Option<ReleaseOptions>,
}

#[derive(Clone, Default)]
pub struct FakeReleases {
    state: Arc<Mutex<ReleaseState>>,
    journal: Journal,
}

impl FakeReleases {
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    pub fn with_release(self, namespace: &str, name: &str, status: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .releases
            .insert((namespace.to_string(), name.to_string()), status.to_string());
        self
    }

    pub fn with_failing_query(self) -> Self {
        self.state.lock().unwrap().fail_query = true;
        self
    }

    pub fn with_failing_upgrade(self) -> Self {
        self.state.lock().unwrap().fail_upgrade = true;
        self
    }

    pub fn queries(&self) -> usize {
        self.state.lock().unwrap().queries
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().creates
    }

    pub fn upgrade_calls(&self) -> usize {
        self.state.lock().unwrap().upgrades
    }

    pub fn last_values(&self) -> Option<DesiredValues> {
        self.state.lock().unwrap().last_values.clone()
    }

    pub fn last_options(&self) -> Option<ReleaseOptions> {
        self.state.lock().unwrap().last_options.clone()
    }

    pub fn status_of(&self, namespace: &str, name: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .releases
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }
}

#[async_trait]
impl ReleaseManager for FakeReleases {
    async fn status(&self, namespace: &str, release: &str) -> Result<Option<String>, ReleaseError> {
        let mut state = self.state.lock().unwrap();
        state.queries += 1;
        if state.fail_query {
            return Err(ReleaseError::CommandFailed {
                command: "helm list".to_string(),
                stderr: "Kubernetes cluster unreachable".to_string(),
            });
        }
        Ok(state
            .releases
            .get(&(namespace.to_string(), release.to_string()))
            .cloned())
    }

    async fn create(
        &self,
        release: &ReleaseInfo,
        values: &DesiredValues,
        options: &ReleaseOptions,
    ) -> Result<(), ReleaseError> {
        self.journal
            .record(format!("create {}/{}", release.namespace, release.name));
        let mut state = self.state.lock().unwrap();
        state.creates += 1;
        state.last_values = Some(values.clone());
        state.last_options = Some(options.clone());
        state.releases.insert(
            (release.namespace.clone(), release.name.clone()),
            "deployed".to_string(),
        );
        Ok(())
    }

    async fn upgrade(
        &self,
        release: &ReleaseInfo,
        values: &DesiredValues,
        options: &ReleaseOptions,
    ) -> Result<(), ReleaseError> {
        self.journal
            .record(format!("upgrade {}/{}", release.namespace, release.name));
        let mut state = self.state.lock().unwrap();
        state.upgrades += 1;
        state.last_values = Some(values.clone());
        state.last_options = Some(options.clone());
        if state.fail_upgrade {
            return Err(ReleaseError::CommandFailed {
                command: "helm upgrade".to_string(),
                stderr: "UPGRADE FAILED: release acme-crm failed, and has been rolled back".to_string(),
            });
        }
        Ok(())
    }
}
