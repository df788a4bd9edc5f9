//! Infrastructure component specifications and handles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The role a component plays in the test topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Message broker or similar stateful service under test.
    Broker,
    /// Coordination service (consensus, leader election, metadata).
    Coordinator,
    /// Workload instance generating traffic against the other components.
    Workload,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComponentKind::Broker => "broker",
            ComponentKind::Coordinator => "coordinator",
            ComponentKind::Workload => "workload",
        };
        f.write_str(s)
    }
}

/// Specification for launching one infrastructure component.
///
/// Workload templates may embed `{n}` in `name`, `endpoint`, or `env`
/// entries; [`ComponentSpec::instantiate`] substitutes the instance number
/// when the provisioner expands the template into N instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// Component name (unique within the topology).
    pub name: String,
    /// Role of this component.
    pub kind: ComponentKind,
    /// Container image to run.
    pub image: String,
    /// Environment variables (`KEY=value` form).
    pub env: Vec<String>,
    /// Address (host:port) at which the component is reachable from the engine.
    pub endpoint: String,
    /// Path of the HTTP health-check endpoint, e.g. `/health`.
    pub health_path: String,
    /// How long to wait for the component to first report healthy.
    pub startup_timeout_secs: u64,
}

impl ComponentSpec {
    /// Create a spec with the common defaults (`/health`, 60s startup window).
    pub fn new(name: &str, kind: ComponentKind, image: &str, endpoint: &str) -> Self {
        Self {
            name: name.into(),
            kind,
            image: image.into(),
            env: Vec::new(),
            endpoint: endpoint.into(),
            health_path: "/health".into(),
            startup_timeout_secs: 60,
        }
    }

    /// Full health-check URL for this component.
    pub fn health_url(&self) -> String {
        format!("http://{}{}", self.endpoint, self.health_path)
    }

    /// Startup timeout as a [`Duration`].
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    /// Expand a workload template into a concrete instance, substituting
    /// `{n}` with the instance number in name, endpoint, and env entries.
    pub fn instantiate(&self, n: u32) -> Self {
        let sub = |s: &str| s.replace("{n}", &n.to_string());
        Self {
            name: sub(&self.name),
            kind: self.kind,
            image: self.image.clone(),
            env: self.env.iter().map(|e| sub(e)).collect(),
            endpoint: sub(&self.endpoint),
            health_path: self.health_path.clone(),
            startup_timeout_secs: self.startup_timeout_secs,
        }
    }
}

/// Complete topology specification handed to the provisioner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfrastructureSpec {
    /// Required components (brokers, coordinators).
    pub components: Vec<ComponentSpec>,
    /// Workload template, expanded into `workload_instances` instances.
    pub workload: Option<ComponentSpec>,
    /// Number of workload instances to launch from the template.
    pub workload_instances: u32,
}

impl InfrastructureSpec {
    /// Create a spec with no workload instances.
    pub fn new(components: Vec<ComponentSpec>) -> Self {
        Self {
            components,
            workload: None,
            workload_instances: 0,
        }
    }

    /// Attach a workload template to be expanded into `instances` copies.
    pub fn with_workload(mut self, template: ComponentSpec, instances: u32) -> Self {
        self.workload = Some(template);
        self.workload_instances = instances;
        self
    }

    /// All concrete component specs this topology launches, workload
    /// instances included.
    pub fn expand(&self) -> Vec<ComponentSpec> {
        let mut all = self.components.clone();
        if let Some(template) = &self.workload {
            for n in 1..=self.workload_instances {
                all.push(template.instantiate(n));
            }
        }
        all
    }
}

/// A launched, managed infrastructure component.
///
/// Owned by the provisioner's registry. The `healthy` flag is only mutated
/// through the registry, keeping concurrent writers serialized per entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfrastructureComponent {
    /// Component name.
    pub name: String,
    /// Role of this component.
    pub kind: ComponentKind,
    /// Orchestrator handle (container id).
    pub container_id: String,
    /// Address (host:port) at which the component is reachable.
    pub endpoint: String,
    /// Full health-check URL.
    pub health_url: String,
    /// Seconds the component took to first report healthy.
    pub startup_secs: f64,
    /// Last observed health state.
    pub healthy: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_url_joins_endpoint_and_path() {
        let spec = ComponentSpec::new("broker-1", ComponentKind::Broker, "img", "10.0.0.2:8080");
        assert_eq!(spec.health_url(), "http://10.0.0.2:8080/health");
    }

    #[test]
    fn instantiate_substitutes_placeholder() {
        let template = ComponentSpec {
            name: "workload-{n}".into(),
            kind: ComponentKind::Workload,
            image: "img".into(),
            env: vec!["INSTANCE={n}".into()],
            endpoint: "10.0.0.1{n}:9000".into(),
            health_path: "/health".into(),
            startup_timeout_secs: 30,
        };

        let inst = template.instantiate(2);
        assert_eq!(inst.name, "workload-2");
        assert_eq!(inst.env, vec!["INSTANCE=2"]);
        assert_eq!(inst.endpoint, "10.0.0.12:9000");
    }

    #[test]
    fn expand_appends_workload_instances() {
        let broker = ComponentSpec::new("broker", ComponentKind::Broker, "img", "b:1");
        let template = ComponentSpec::new("workload-{n}", ComponentKind::Workload, "img", "w{n}:1");
        let spec = InfrastructureSpec::new(vec![broker]).with_workload(template, 3);

        let all = spec.expand();
        assert_eq!(all.len(), 4);
        assert_eq!(all[1].name, "workload-1");
        assert_eq!(all[3].name, "workload-3");
    }

    #[test]
    fn expand_without_workload() {
        let broker = ComponentSpec::new("broker", ComponentKind::Broker, "img", "b:1");
        let spec = InfrastructureSpec::new(vec![broker]);
        assert_eq!(spec.expand().len(), 1);
    }
}
