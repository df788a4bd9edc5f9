//! HTTP probe client for health checks and monitoring.
//!
//! The monitor and recovery waiter go through the [`HttpProbe`] trait so
//! tests can script endpoint behavior without a network. The production
//! implementation is [`ReqwestProbe`].

use crate::error::ProbeError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::orchestrator::MockOrchestrator;

/// A completed HTTP probe response.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    /// HTTP status code.
    pub status: u16,
    /// Round-trip latency.
    pub latency: Duration,
    /// Response body (truncated by implementations as needed).
    pub body: String,
}

impl ProbeResponse {
    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP probe capability.
#[async_trait]
pub trait HttpProbe: Send + Sync {
    /// GET the URL with the given timeout, measuring latency.
    async fn get(&self, url: &str, timeout: Duration) -> Result<ProbeResponse, ProbeError>;
}

/// Production probe backed by reqwest.
pub struct ReqwestProbe {
    client: reqwest::Client,
}

impl ReqwestProbe {
    /// Create a probe with a default client.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpProbe for ReqwestProbe {
    async fn get(&self, url: &str, timeout: Duration) -> Result<ProbeResponse, ProbeError> {
        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProbeError::Timeout {
                        timeout_ms: timeout.as_millis() as u64,
                    }
                } else {
                    ProbeError::Request(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(ProbeResponse {
            status,
            latency: started.elapsed(),
            body,
        })
    }
}

/// Per-URL behavior scripted into a [`MockProbe`].
#[derive(Clone)]
enum ProbeScript {
    /// Respond with the given status and latency.
    Respond { status: u16, latency_ms: u64 },
    /// Fail the request outright.
    Fail,
    /// Succeed only while the linked mock container is running.
    Container { mock: MockOrchestrator, name: String },
}

#[derive(Default)]
struct MockProbeInner {
    scripts: HashMap<String, ProbeScript>,
    default_status: u16,
    default_latency_ms: u64,
    requests: Vec<String>,
}

/// Mock probe for testing.
///
/// Unscripted URLs respond 200 with a small latency; individual URLs can be
/// overridden, failed, or linked to a [`MockOrchestrator`] container so the
/// probe tracks its running state.
pub struct MockProbe {
    inner: Arc<Mutex<MockProbeInner>>,
}

impl Clone for MockProbe {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for MockProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProbe {
    /// Create a probe where every URL answers 200 in 5ms.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockProbeInner {
                scripts: HashMap::new(),
                default_status: 200,
                default_latency_ms: 5,
                requests: Vec::new(),
            })),
        }
    }

    /// Override the response for one URL.
    pub fn set_response(&self, url: &str, status: u16, latency_ms: u64) {
        self.inner
            .lock()
            .unwrap()
            .scripts
            .insert(url.to_string(), ProbeScript::Respond { status, latency_ms });
    }

    /// Make requests to one URL fail at the transport level.
    pub fn set_down(&self, url: &str) {
        self.inner
            .lock()
            .unwrap()
            .scripts
            .insert(url.to_string(), ProbeScript::Fail);
    }

    /// Remove any override for one URL.
    pub fn clear(&self, url: &str) {
        self.inner.lock().unwrap().scripts.remove(url);
    }

    /// Tie a URL's health to a mock container: 200 while running, transport
    /// failure while stopped.
    pub fn link_container(&self, url: &str, mock: &MockOrchestrator, container: &str) {
        self.inner.lock().unwrap().scripts.insert(
            url.to_string(),
            ProbeScript::Container {
                mock: mock.clone(),
                name: container.to_string(),
            },
        );
    }

    /// All URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.inner.lock().unwrap().requests.clone()
    }
}

#[async_trait]
impl HttpProbe for MockProbe {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<ProbeResponse, ProbeError> {
        let script = {
            let mut inner = self.inner.lock().unwrap();
            inner.requests.push(url.to_string());
            inner.scripts.get(url).cloned().unwrap_or(ProbeScript::Respond {
                status: inner.default_status,
                latency_ms: inner.default_latency_ms,
            })
        };

        match script {
            ProbeScript::Respond { status, latency_ms } => Ok(ProbeResponse {
                status,
                latency: Duration::from_millis(latency_ms),
                body: String::new(),
            }),
            ProbeScript::Fail => Err(ProbeError::Request(format!("connection refused: {url}"))),
            ProbeScript::Container { mock, name } => {
                if mock.container_running(&name) == Some(true) {
                    Ok(ProbeResponse {
                        status: 200,
                        latency: Duration::from_millis(5),
                        body: String::new(),
                    })
                } else {
                    Err(ProbeError::Request(format!("connection refused: {url}")))
                }
            }
        }
    }
}
