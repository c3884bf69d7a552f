//! # Component Health Probe
//!
//! The installer boundary: given the configured component set, ensure the
//! components exist and report each one's health. The shipped implementation
//! probes Deployment readiness in the target namespace; chart rendering and
//! operand deployment live outside this operator.

use crate::controller::components::{ComponentReport, ComponentSet};
use crate::crd::{BackplaneConfig, ComponentHealth};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::{Api, Client};
use tracing::debug;

/// Installer collaborator. Ensures the configured components and reports
/// their health signals for aggregation.
#[async_trait]
pub trait ComponentInstaller: Send + Sync {
    async fn ensure_components(
        &self,
        config: &BackplaneConfig,
        components: &ComponentSet,
    ) -> Result<Vec<ComponentReport>, kube::Error>;
}

/// Probes one Deployment per component in the target namespace and maps its
/// rollout state to a health signal.
#[derive(Clone)]
pub struct DeploymentProber {
    client: Client,
    default_namespace: String,
}

impl std::fmt::Debug for DeploymentProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentProber")
            .field("default_namespace", &self.default_namespace)
            .finish_non_exhaustive()
    }
}

impl DeploymentProber {
    pub fn new(client: Client, default_namespace: impl Into<String>) -> Self {
        Self {
            client,
            default_namespace: default_namespace.into(),
        }
    }

    fn target_namespace<'a>(&'a self, config: &'a BackplaneConfig) -> &'a str {
        config
            .spec
            .target_namespace
            .as_deref()
            .unwrap_or(&self.default_namespace)
    }
}

#[async_trait]
impl ComponentInstaller for DeploymentProber {
    async fn ensure_components(
        &self,
        config: &BackplaneConfig,
        components: &ComponentSet,
    ) -> Result<Vec<ComponentReport>, kube::Error> {
        let namespace = self.target_namespace(config);
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);

        let mut reports = Vec::with_capacity(components.len());
        for name in components.iter() {
            let report = match api.get_opt(name).await? {
                Some(deployment) => deployment_health(name, &deployment),
                None => {
                    debug!(component = name, namespace, "component deployment not found");
                    ComponentReport::new(name, ComponentHealth::Progressing)
                        .with_message(format!("deployment {namespace}/{name} does not exist yet"))
                }
            };
            reports.push(report);
        }
        Ok(reports)
    }
}

/// Map a Deployment's rollout state to a component health signal.
///
/// ReplicaFailure marks the component Degraded; a full complement of ready
/// replicas marks it Available; anything else is still Progressing. A
/// deployment scaled to zero replicas counts as Available: zero desired and
/// zero ready is a settled rollout, not one in flight, so an administratively
/// paused component must not pin the config at Progressing.
fn deployment_health(name: &str, deployment: &Deployment) -> ComponentReport {
    let desired = deployment
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(1);
    let status = deployment.status.as_ref();
    let ready = status.and_then(|s| s.ready_replicas).unwrap_or(0);

    let replica_failure = status
        .and_then(|s| s.conditions.as_ref())
        .map(|conds| {
            conds
                .iter()
                .any(|c| c.type_ == "ReplicaFailure" && c.status == "True")
        })
        .unwrap_or(false);

    if replica_failure {
        return ComponentReport::new(name, ComponentHealth::Degraded)
            .with_message(format!("deployment {name} reports ReplicaFailure"));
    }

    if ready >= desired {
        ComponentReport::new(name, ComponentHealth::Available)
    } else {
        ComponentReport::new(name, ComponentHealth::Progressing).with_message(format!(
            "deployment {name} has {ready}/{desired} ready replicas"
        ))
    }
}
