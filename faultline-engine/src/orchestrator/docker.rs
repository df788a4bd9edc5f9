//! Docker implementation of the orchestrator capability via bollard.

use super::{
    ContainerConfig, ContainerOrchestrator, ContainerState, ExecOutput, NetworkState,
    ResourceLimits,
};
use crate::error::{OrchestratorError, OrchestratorResult};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, LogsOptions, RemoveContainerOptions,
    StartContainerOptions, StatsOptions, StopContainerOptions, UpdateContainerOptions,
};
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::models::{EndpointSettings, HostConfig};
use bollard::network::{
    ConnectNetworkOptions, CreateNetworkOptions, DisconnectNetworkOptions, InspectNetworkOptions,
};
use bollard::Docker;
use faultline_types::ResourceStats;
use futures_util::StreamExt;

/// Seconds docker waits before SIGKILL on stop.
const STOP_TIMEOUT_SECS: i64 = 10;

/// Orchestrator backed by the local Docker daemon.
pub struct DockerOrchestrator {
    docker: Docker,
}

impl DockerOrchestrator {
    /// Connect with the local Docker defaults (socket or named pipe).
    pub fn connect() -> OrchestratorResult<Self> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker })
    }

    /// Wrap an existing bollard client.
    pub fn from_client(docker: Docker) -> Self {
        Self { docker }
    }

    fn not_found(e: bollard::errors::Error, name: &str, container: bool) -> OrchestratorError {
        if let bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        } = e
        {
            if container {
                OrchestratorError::ContainerNotFound { name: name.into() }
            } else {
                OrchestratorError::NetworkNotFound { name: name.into() }
            }
        } else {
            OrchestratorError::from(e)
        }
    }
}

#[async_trait]
impl ContainerOrchestrator for DockerOrchestrator {
    async fn create_network(&self, name: &str) -> OrchestratorResult<String> {
        let response = self
            .docker
            .create_network(CreateNetworkOptions {
                name,
                driver: "bridge",
                ..Default::default()
            })
            .await?;
        Ok(response.id.unwrap_or_default())
    }

    async fn remove_network(&self, name: &str) -> OrchestratorResult<()> {
        self.docker
            .remove_network(name)
            .await
            .map_err(|e| Self::not_found(e, name, false))
    }

    async fn run_container(
        &self,
        name: &str,
        config: &ContainerConfig,
    ) -> OrchestratorResult<String> {
        let host_config = HostConfig {
            memory: config.limits.memory_bytes,
            nano_cpus: config.limits.nano_cpus,
            network_mode: config.network.clone(),
            ..Default::default()
        };

        let created = self
            .docker
            .create_container(
                Some(CreateContainerOptions {
                    name,
                    platform: None,
                }),
                Config::<String> {
                    image: Some(config.image.clone()),
                    env: Some(config.env.clone()),
                    host_config: Some(host_config),
                    ..Default::default()
                },
            )
            .await?;

        self.docker
            .start_container(name, None::<StartContainerOptions<String>>)
            .await?;

        Ok(created.id)
    }

    async fn stop_container(&self, name: &str) -> OrchestratorResult<()> {
        self.docker
            .stop_container(name, Some(StopContainerOptions { t: STOP_TIMEOUT_SECS }))
            .await
            .map_err(|e| Self::not_found(e, name, true))
    }

    async fn start_container(&self, name: &str) -> OrchestratorResult<()> {
        self.docker
            .start_container(name, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| Self::not_found(e, name, true))
    }

    async fn remove_container(&self, name: &str) -> OrchestratorResult<()> {
        self.docker
            .remove_container(
                name,
                Some(RemoveContainerOptions {
                    force: true,
                    v: true,
                    ..Default::default()
                }),
            )
            .await
            .map_err(|e| Self::not_found(e, name, true))
    }

    async fn connect_network(&self, network: &str, container: &str) -> OrchestratorResult<()> {
        self.docker
            .connect_network(
                network,
                ConnectNetworkOptions {
                    container,
                    endpoint_config: EndpointSettings::default(),
                },
            )
            .await
            .map_err(|e| Self::not_found(e, network, false))
    }

    async fn disconnect_network(&self, network: &str, container: &str) -> OrchestratorResult<()> {
        self.docker
            .disconnect_network(
                network,
                DisconnectNetworkOptions {
                    container,
                    force: true,
                },
            )
            .await
            .map_err(|e| Self::not_found(e, network, false))
    }

    async fn update_resources(
        &self,
        container: &str,
        limits: &ResourceLimits,
    ) -> OrchestratorResult<()> {
        self.docker
            .update_container(
                container,
                UpdateContainerOptions::<String> {
                    memory: limits.memory_bytes,
                    // Docker requires memory_swap >= memory when shrinking.
                    memory_swap: limits.memory_bytes,
                    nano_cp_us: limits.nano_cpus,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| Self::not_found(e, container, true))
    }

    async fn exec(&self, container: &str, cmd: &[&str]) -> OrchestratorResult<ExecOutput> {
        let exec = self
            .docker
            .create_exec(
                container,
                CreateExecOptions {
                    cmd: Some(cmd.iter().map(|s| s.to_string()).collect()),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| Self::not_found(e, container, true))?;

        let mut stdout = String::new();
        let mut stderr = String::new();

        if let StartExecResults::Attached { mut output, .. } =
            self.docker.start_exec(&exec.id, None).await?
        {
            while let Some(Ok(msg)) = output.next().await {
                match msg {
                    bollard::container::LogOutput::StdOut { message } => {
                        stdout.push_str(&String::from_utf8_lossy(&message));
                    }
                    bollard::container::LogOutput::StdErr { message } => {
                        stderr.push_str(&String::from_utf8_lossy(&message));
                    }
                    _ => {}
                }
            }
        }

        let inspect = self.docker.inspect_exec(&exec.id).await?;
        let exit_code = inspect.exit_code.unwrap_or(-1);

        Ok(ExecOutput {
            stdout,
            stderr,
            exit_code,
        })
    }

    async fn logs(
        &self,
        container: &str,
        tail: usize,
        timestamps: bool,
    ) -> OrchestratorResult<String> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            timestamps,
            tail: tail.to_string(),
            follow: false,
            ..Default::default()
        };

        let mut stream = self.docker.logs(container, Some(options));
        let mut logs = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(output) => logs.push_str(&output.to_string()),
                Err(e) => return Err(Self::not_found(e, container, true)),
            }
        }
        Ok(logs)
    }

    async fn stats(&self, container: &str) -> OrchestratorResult<ResourceStats> {
        let mut stream = self.docker.stats(
            container,
            Some(StatsOptions {
                stream: false,
                one_shot: true,
            }),
        );

        let stats = match stream.next().await {
            Some(Ok(stats)) => stats,
            Some(Err(e)) => return Err(Self::not_found(e, container, true)),
            None => {
                return Err(OrchestratorError::Backend(format!(
                    "no stats reading for {container}"
                )))
            }
        };

        let cpu_delta = stats.cpu_stats.cpu_usage.total_usage as f64
            - stats.precpu_stats.cpu_usage.total_usage as f64;
        let system_delta = stats.cpu_stats.system_cpu_usage.unwrap_or(0) as f64
            - stats.precpu_stats.system_cpu_usage.unwrap_or(0) as f64;
        let online_cpus = stats.cpu_stats.online_cpus.unwrap_or(1) as f64;
        let cpu_percent = if system_delta > 0.0 && cpu_delta >= 0.0 {
            (cpu_delta / system_delta) * online_cpus * 100.0
        } else {
            0.0
        };

        Ok(ResourceStats {
            cpu_percent,
            memory_bytes: stats.memory_stats.usage.unwrap_or(0),
            memory_limit_bytes: stats.memory_stats.limit.unwrap_or(0),
        })
    }

    async fn inspect_container(&self, container: &str) -> OrchestratorResult<ContainerState> {
        let inspect = self
            .docker
            .inspect_container(container, None::<InspectContainerOptions>)
            .await
            .map_err(|e| Self::not_found(e, container, true))?;

        let (status, running) = inspect
            .state
            .as_ref()
            .map(|s| {
                (
                    s.status.map(|st| st.to_string()).unwrap_or_default(),
                    s.running.unwrap_or(false),
                )
            })
            .unwrap_or_default();

        let ports = inspect
            .network_settings
            .as_ref()
            .and_then(|ns| ns.ports.as_ref())
            .map(|ports| ports.keys().cloned().collect())
            .unwrap_or_default();

        let networks = inspect
            .network_settings
            .as_ref()
            .and_then(|ns| ns.networks.as_ref())
            .map(|nets| nets.keys().cloned().collect())
            .unwrap_or_default();

        let limits = inspect
            .host_config
            .as_ref()
            .map(|hc| ResourceLimits {
                memory_bytes: hc.memory.filter(|m| *m > 0),
                nano_cpus: hc.nano_cpus.filter(|c| *c > 0),
            })
            .unwrap_or_default();

        Ok(ContainerState {
            id: inspect.id.unwrap_or_default(),
            status,
            running,
            ports,
            networks,
            limits,
        })
    }

    async fn inspect_network(&self, network: &str) -> OrchestratorResult<NetworkState> {
        let inspect = self
            .docker
            .inspect_network(network, None::<InspectNetworkOptions<String>>)
            .await
            .map_err(|e| Self::not_found(e, network, false))?;

        let members = inspect
            .containers
            .as_ref()
            .map(|cs| {
                cs.values()
                    .filter_map(|c| c.name.clone())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Ok(NetworkState {
            id: inspect.id.unwrap_or_default(),
            driver: inspect.driver.unwrap_or_default(),
            members,
        })
    }
}
