//! Mock orchestrator for testing.
//!
//! Records every call for verification, serves scripted container/network
//! state, and can be told to fail specific operations.

use super::{
    ContainerConfig, ContainerOrchestrator, ContainerState, ExecOutput, NetworkState,
    ResourceLimits,
};
use crate::error::{OrchestratorError, OrchestratorResult};
use async_trait::async_trait;
use faultline_types::ResourceStats;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct MockNetwork {
    id: String,
    driver: String,
}

#[derive(Debug, Clone)]
struct MockContainer {
    id: String,
    running: bool,
    networks: BTreeSet<String>,
    limits: ResourceLimits,
    stats: ResourceStats,
    logs: String,
    ports: Vec<String>,
}

#[derive(Debug, Default)]
struct MockOrchestratorInner {
    networks: BTreeMap<String, MockNetwork>,
    containers: BTreeMap<String, MockContainer>,
    calls: Vec<String>,
    fail_after: HashMap<String, (usize, String)>,
    exec_script: HashMap<String, (i64, String)>,
    next_id: u64,
}

/// Mock orchestrator for testing.
///
/// Cloning shares state, so a clone handed to the engine can be inspected
/// from the test afterwards.
#[derive(Debug, Default)]
pub struct MockOrchestrator {
    inner: Arc<Mutex<MockOrchestratorInner>>,
}

impl Clone for MockOrchestrator {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl MockOrchestrator {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded calls, in order, as `"<op> <args>"` strings.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Number of recorded calls starting with the given prefix.
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Cause the next call of the named operation to fail.
    pub fn fail_next(&self, op: &str, error: &str) {
        self.fail_after(op, 0, error);
    }

    /// Cause the named operation to fail once, after `skip` more calls of it
    /// have succeeded.
    pub fn fail_after(&self, op: &str, skip: usize, error: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_after
            .insert(op.to_string(), (skip, error.to_string()));
    }

    /// Script the output of `exec` in the given container.
    pub fn script_exec(&self, container: &str, exit_code: i64, stdout: &str) {
        self.inner
            .lock()
            .unwrap()
            .exec_script
            .insert(container.to_string(), (exit_code, stdout.to_string()));
    }

    /// Set the stats reading served for a container.
    pub fn set_stats(&self, container: &str, stats: ResourceStats) {
        if let Some(c) = self.inner.lock().unwrap().containers.get_mut(container) {
            c.stats = stats;
        }
    }

    /// Set the logs served for a container.
    pub fn set_logs(&self, container: &str, logs: &str) {
        if let Some(c) = self.inner.lock().unwrap().containers.get_mut(container) {
            c.logs = logs.to_string();
        }
    }

    /// Whether the named container is currently running, if it exists.
    pub fn container_running(&self, container: &str) -> Option<bool> {
        self.inner
            .lock()
            .unwrap()
            .containers
            .get(container)
            .map(|c| c.running)
    }

    /// Networks the named container is attached to.
    pub fn networks_of(&self, container: &str) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .containers
            .get(container)
            .map(|c| c.networks.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Current limits of the named container.
    pub fn limits_of(&self, container: &str) -> Option<ResourceLimits> {
        self.inner
            .lock()
            .unwrap()
            .containers
            .get(container)
            .map(|c| c.limits.clone())
    }

    /// Whether the named network exists.
    pub fn network_exists(&self, network: &str) -> bool {
        self.inner.lock().unwrap().networks.contains_key(network)
    }

    fn record(
        inner: &mut MockOrchestratorInner,
        op: &str,
        args: &str,
    ) -> Result<(), OrchestratorError> {
        inner.calls.push(format!("{op} {args}"));
        let due = match inner.fail_after.get_mut(op) {
            Some((0, _)) => true,
            Some((skip, _)) => {
                *skip -= 1;
                false
            }
            None => false,
        };
        if due {
            if let Some((_, error)) = inner.fail_after.remove(op) {
                return Err(OrchestratorError::Backend(error));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ContainerOrchestrator for MockOrchestrator {
    async fn create_network(&self, name: &str) -> OrchestratorResult<String> {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, "create_network", name)?;
        inner.next_id += 1;
        let id = format!("mock-net-{}", inner.next_id);
        inner.networks.insert(
            name.to_string(),
            MockNetwork {
                id: id.clone(),
                driver: "bridge".into(),
            },
        );
        Ok(id)
    }

    async fn remove_network(&self, name: &str) -> OrchestratorResult<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, "remove_network", name)?;
        if inner.networks.remove(name).is_none() {
            return Err(OrchestratorError::NetworkNotFound { name: name.into() });
        }
        for container in inner.containers.values_mut() {
            container.networks.remove(name);
        }
        Ok(())
    }

    async fn run_container(
        &self,
        name: &str,
        config: &ContainerConfig,
    ) -> OrchestratorResult<String> {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, "run_container", name)?;
        inner.next_id += 1;
        let id = format!("mock-ctr-{}", inner.next_id);
        let mut networks = BTreeSet::new();
        if let Some(net) = &config.network {
            networks.insert(net.clone());
        }
        inner.containers.insert(
            name.to_string(),
            MockContainer {
                id: id.clone(),
                running: true,
                networks,
                limits: config.limits.clone(),
                stats: ResourceStats::default(),
                logs: String::new(),
                ports: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn stop_container(&self, name: &str) -> OrchestratorResult<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, "stop_container", name)?;
        match inner.containers.get_mut(name) {
            Some(c) => {
                c.running = false;
                Ok(())
            }
            None => Err(OrchestratorError::ContainerNotFound { name: name.into() }),
        }
    }

    async fn start_container(&self, name: &str) -> OrchestratorResult<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, "start_container", name)?;
        match inner.containers.get_mut(name) {
            Some(c) => {
                c.running = true;
                Ok(())
            }
            None => Err(OrchestratorError::ContainerNotFound { name: name.into() }),
        }
    }

    async fn remove_container(&self, name: &str) -> OrchestratorResult<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, "remove_container", name)?;
        match inner.containers.remove(name) {
            Some(_) => Ok(()),
            None => Err(OrchestratorError::ContainerNotFound { name: name.into() }),
        }
    }

    async fn connect_network(&self, network: &str, container: &str) -> OrchestratorResult<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, "connect_network", &format!("{network} {container}"))?;
        if !inner.networks.contains_key(network) {
            return Err(OrchestratorError::NetworkNotFound {
                name: network.into(),
            });
        }
        match inner.containers.get_mut(container) {
            Some(c) => {
                c.networks.insert(network.to_string());
                Ok(())
            }
            None => Err(OrchestratorError::ContainerNotFound {
                name: container.into(),
            }),
        }
    }

    async fn disconnect_network(&self, network: &str, container: &str) -> OrchestratorResult<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::record(
            &mut inner,
            "disconnect_network",
            &format!("{network} {container}"),
        )?;
        match inner.containers.get_mut(container) {
            Some(c) => {
                c.networks.remove(network);
                Ok(())
            }
            None => Err(OrchestratorError::ContainerNotFound {
                name: container.into(),
            }),
        }
    }

    async fn update_resources(
        &self,
        container: &str,
        limits: &ResourceLimits,
    ) -> OrchestratorResult<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, "update_resources", container)?;
        match inner.containers.get_mut(container) {
            Some(c) => {
                c.limits = limits.clone();
                Ok(())
            }
            None => Err(OrchestratorError::ContainerNotFound {
                name: container.into(),
            }),
        }
    }

    async fn exec(&self, container: &str, cmd: &[&str]) -> OrchestratorResult<ExecOutput> {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, "exec", &format!("{container} {}", cmd.join(" ")))?;
        if !inner.containers.contains_key(container) {
            return Err(OrchestratorError::ContainerNotFound {
                name: container.into(),
            });
        }
        let (exit_code, stdout) = inner
            .exec_script
            .get(container)
            .cloned()
            .unwrap_or((0, String::new()));
        Ok(ExecOutput {
            stdout,
            stderr: String::new(),
            exit_code,
        })
    }

    async fn logs(
        &self,
        container: &str,
        _tail: usize,
        _timestamps: bool,
    ) -> OrchestratorResult<String> {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, "logs", container)?;
        match inner.containers.get(container) {
            Some(c) => Ok(c.logs.clone()),
            None => Err(OrchestratorError::ContainerNotFound {
                name: container.into(),
            }),
        }
    }

    async fn stats(&self, container: &str) -> OrchestratorResult<ResourceStats> {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, "stats", container)?;
        match inner.containers.get(container) {
            Some(c) => Ok(c.stats.clone()),
            None => Err(OrchestratorError::ContainerNotFound {
                name: container.into(),
            }),
        }
    }

    async fn inspect_container(&self, container: &str) -> OrchestratorResult<ContainerState> {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, "inspect_container", container)?;
        match inner.containers.get(container) {
            Some(c) => Ok(ContainerState {
                id: c.id.clone(),
                status: if c.running { "running" } else { "exited" }.into(),
                running: c.running,
                ports: c.ports.clone(),
                networks: c.networks.iter().cloned().collect(),
                limits: c.limits.clone(),
            }),
            None => Err(OrchestratorError::ContainerNotFound {
                name: container.into(),
            }),
        }
    }

    async fn inspect_network(&self, network: &str) -> OrchestratorResult<NetworkState> {
        let mut inner = self.inner.lock().unwrap();
        Self::record(&mut inner, "inspect_network", network)?;
        let net = match inner.networks.get(network) {
            Some(n) => n.clone(),
            None => {
                return Err(OrchestratorError::NetworkNotFound {
                    name: network.into(),
                })
            }
        };
        let members = inner
            .containers
            .iter()
            .filter(|(_, c)| c.networks.contains(network))
            .map(|(name, _)| name.clone())
            .collect();
        Ok(NetworkState {
            id: net.id,
            driver: net.driver,
            members,
        })
    }
}
