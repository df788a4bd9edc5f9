//! Recovery waiter — bounded post-heal polling.
//!
//! Polls every component's health endpoint until all are healthy or the
//! scenario's recovery limit elapses. The timeout is an outcome, never an
//! error.

use crate::config::TimingConfig;
use crate::context::RunContext;
use crate::probe::HttpProbe;
use crate::provision::ComponentRegistry;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Result of a bounded recovery wait.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryOutcome {
    /// Whether every component reported healthy within the limit.
    pub recovered: bool,
    /// Seconds from heal completion until full health (the limit value on
    /// timeout).
    pub recovery_time_secs: f64,
}

/// Bounded polling loop for post-heal recovery.
pub struct RecoveryWaiter {
    probe: Arc<dyn HttpProbe>,
    registry: ComponentRegistry,
    timing: TimingConfig,
}

impl RecoveryWaiter {
    /// Create a waiter over the given registry.
    pub fn new(probe: Arc<dyn HttpProbe>, registry: ComponentRegistry, timing: TimingConfig) -> Self {
        Self {
            probe,
            registry,
            timing,
        }
    }

    /// Poll until all components are healthy or `limit` elapses.
    pub async fn wait(&self, limit: Duration, ctx: &RunContext) -> RecoveryOutcome {
        let started = Instant::now();
        let deadline = started + limit;

        loop {
            if self.all_healthy().await {
                let recovery_time_secs = started.elapsed().as_secs_f64();
                tracing::info!(
                    correlation_id = %ctx.correlation_id,
                    recovery_time_secs,
                    "All components recovered"
                );
                return RecoveryOutcome {
                    recovered: true,
                    recovery_time_secs,
                };
            }

            if Instant::now() >= deadline {
                tracing::warn!(
                    correlation_id = %ctx.correlation_id,
                    limit_secs = limit.as_secs_f64(),
                    "Recovery timed out"
                );
                return RecoveryOutcome {
                    recovered: false,
                    recovery_time_secs: limit.as_secs_f64(),
                };
            }

            tokio::time::sleep(self.timing.recovery_poll_interval()).await;
        }
    }

    /// Probe every component once, concurrently, updating registry flags.
    async fn all_healthy(&self) -> bool {
        let targets: Vec<(String, String)> = self
            .registry
            .iter()
            .map(|entry| (entry.name.clone(), entry.health_url.clone()))
            .collect();

        let checks = targets.into_iter().map(|(name, url)| {
            let probe = Arc::clone(&self.probe);
            let timeout = self.timing.probe_timeout();
            async move {
                let healthy = match probe.get(&url, timeout).await {
                    Ok(response) => response.is_success(),
                    Err(_) => false,
                };
                (name, healthy)
            }
        });

        let mut all = true;
        for (name, healthy) in join_all(checks).await {
            if let Some(mut entry) = self.registry.get_mut(&name) {
                entry.healthy = healthy;
            }
            all &= healthy;
        }
        all
    }
}
