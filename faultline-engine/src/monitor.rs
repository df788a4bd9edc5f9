//! Behavior monitor — concurrent sampling loop.
//!
//! Runs as an independent task spanning the scenario's failure window and
//! produces one [`BehaviorSample`] per tick. Each tick fans out all probes
//! concurrently and joins them before the tick completes; ticks never
//! overlap. The sequence is finite and ordered; a new scenario execution
//! creates a new monitor.

use crate::config::TimingConfig;
use crate::context::{unix_ms, RunContext};
use crate::error::MonitorError;
use crate::orchestrator::ContainerOrchestrator;
use crate::probe::HttpProbe;
use crate::provision::ComponentRegistry;
use faultline_types::{
    BehaviorSample, ComponentKind, ConnectivityEntry, ProbeResult, ResourceStats,
};
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio::task::JoinHandle;

/// Concurrent sampling loop over the component registry.
pub struct BehaviorMonitor {
    orchestrator: Arc<dyn ContainerOrchestrator>,
    probe: Arc<dyn HttpProbe>,
    registry: ComponentRegistry,
    timing: TimingConfig,
}

impl BehaviorMonitor {
    /// Create a monitor over the given registry.
    pub fn new(
        orchestrator: Arc<dyn ContainerOrchestrator>,
        probe: Arc<dyn HttpProbe>,
        registry: ComponentRegistry,
        timing: TimingConfig,
    ) -> Self {
        Self {
            orchestrator,
            probe,
            registry,
            timing,
        }
    }

    /// Spawn the monitoring task for the given window.
    ///
    /// The task samples until `duration` elapses or `cancel` flips to true,
    /// then returns the ordered sample sequence.
    pub fn spawn(
        self,
        duration: Duration,
        mut cancel: watch::Receiver<bool>,
        ctx: RunContext,
    ) -> JoinHandle<Vec<BehaviorSample>> {
        tokio::spawn(async move {
            let mut samples = Vec::new();
            let deadline = Instant::now() + duration;

            loop {
                let sample = self.tick(&ctx).await;
                samples.push(sample);

                if Instant::now() >= deadline || *cancel.borrow() {
                    break;
                }

                // Next tick starts only after this sleep; ticks never overlap.
                tokio::select! {
                    _ = tokio::time::sleep(self.timing.monitor_interval()) => {}
                    changed = cancel.changed() => {
                        match changed {
                            Ok(()) if *cancel.borrow() => break,
                            Ok(()) => {}
                            // Sender gone: cancellation can never arrive,
                            // keep the tick cadence.
                            Err(_) => tokio::time::sleep(self.timing.monitor_interval()).await,
                        }
                    }
                }
                if Instant::now() >= deadline {
                    break;
                }
            }

            tracing::debug!(
                correlation_id = %ctx.correlation_id,
                samples = samples.len(),
                "Monitoring window closed"
            );
            samples
        })
    }

    /// Perform one sampling tick: health probes, resource stats, and the
    /// workload connectivity matrix, all fanned out and joined.
    async fn tick(&self, ctx: &RunContext) -> BehaviorSample {
        let components: Vec<(String, String, ComponentKind, String)> = self
            .registry
            .iter()
            .map(|entry| {
                (
                    entry.name.clone(),
                    entry.health_url.clone(),
                    entry.kind,
                    entry.endpoint.clone(),
                )
            })
            .collect();

        let timestamp_ms = unix_ms();
        let mut degraded = false;

        // Health probes, concurrently.
        let probe_futures = components.iter().map(|(name, url, _, _)| {
            let probe = Arc::clone(&self.probe);
            let timeout = self.timing.probe_timeout();
            async move {
                let started = Instant::now();
                let result = match probe.get(url, timeout).await {
                    Ok(response) => ProbeResult {
                        success: response.is_success(),
                        status: response.status,
                        latency_ms: response.latency.as_secs_f64() * 1000.0,
                    },
                    Err(_) => ProbeResult::failed(started.elapsed().as_secs_f64() * 1000.0),
                };
                (name.clone(), result)
            }
        });

        // Resource stats, concurrently.
        let stats_futures = components.iter().map(|(name, _, _, _)| {
            let orchestrator = Arc::clone(&self.orchestrator);
            let name = name.clone();
            async move {
                let stats = orchestrator.stats(&name).await;
                (name, stats)
            }
        });

        // Pairwise connectivity between workload instances, concurrently.
        let workloads: Vec<(String, String)> = components
            .iter()
            .filter(|(_, _, kind, _)| *kind == ComponentKind::Workload)
            .map(|(name, _, _, endpoint)| (name.clone(), endpoint.clone()))
            .collect();
        let mut pairs = Vec::new();
        for (from, _) in &workloads {
            for (to, to_endpoint) in &workloads {
                if from != to {
                    pairs.push((from.clone(), to.clone(), to_endpoint.clone()));
                }
            }
        }
        let connectivity_futures = pairs.into_iter().map(|(from, to, to_endpoint)| {
            let orchestrator = Arc::clone(&self.orchestrator);
            async move {
                let cmd = format!("wget -q -T 2 -O /dev/null http://{to_endpoint}/");
                let result = orchestrator.exec(&from, &["sh", "-c", &cmd]).await;
                (from, to, result)
            }
        });

        let (probe_results, stats_results, connectivity_results) = tokio::join!(
            join_all(probe_futures),
            join_all(stats_futures),
            join_all(connectivity_futures),
        );

        let mut probes = BTreeMap::new();
        for (name, result) in probe_results {
            // Keep the registry's health flag in step with what we observe.
            if let Some(mut entry) = self.registry.get_mut(&name) {
                entry.healthy = result.success;
            }
            probes.insert(name, result);
        }

        let mut resources = BTreeMap::new();
        for (name, result) in stats_results {
            match result {
                Ok(stats) => {
                    resources.insert(name, stats);
                }
                Err(e) => {
                    degraded = true;
                    let error = MonitorError {
                        reason: format!("stats for {name}: {e}"),
                    };
                    tracing::warn!(
                        correlation_id = %ctx.correlation_id,
                        %error,
                        "Partial sample"
                    );
                    resources.insert(name, ResourceStats::default());
                }
            }
        }

        let mut connectivity = Vec::new();
        for (from, to, result) in connectivity_results {
            let reachable = match result {
                Ok(output) => output.success(),
                Err(e) => {
                    degraded = true;
                    let error = MonitorError {
                        reason: format!("connectivity {from}->{to}: {e}"),
                    };
                    tracing::warn!(
                        correlation_id = %ctx.correlation_id,
                        %error,
                        "Partial sample"
                    );
                    false
                }
            };
            connectivity.push(ConnectivityEntry {
                from,
                to,
                reachable,
            });
        }

        BehaviorSample {
            timestamp_ms,
            probes,
            resources,
            connectivity,
            degraded,
        }
    }
}
