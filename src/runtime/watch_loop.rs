//! # Watch Loop
//!
//! Runs the kube-runtime controller over BackplaneConfig resources until
//! shutdown.

use crate::constants;
use crate::controller::{reconcile, Reconciler};
use crate::crd::BackplaneConfig;
use crate::runtime::error_policy::error_policy;
use anyhow::Result;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::Api;
use kube_runtime::controller::Controller;
use kube_runtime::reflector::ObjectRef;
use kube_runtime::watcher;
use std::sync::Arc;
use tracing::{debug, warn};

/// Drive the controller until a shutdown signal arrives.
///
/// Reconciles are triggered by BackplaneConfig watch events, by component
/// workload changes in the target namespace, and by the periodic requeue the
/// reconciler schedules.
pub async fn run_watch_loop(
    configs: Api<BackplaneConfig>,
    reconciler: Arc<Reconciler>,
) -> Result<()> {
    let deployments: Api<Deployment> =
        Api::namespaced(reconciler.client.clone(), &reconciler.target_namespace);

    Controller::new(configs, watcher::Config::default())
        .watches(deployments, watcher::Config::default(), |_deployment| {
            // Any workload change in the target namespace re-checks the
            // singleton config's component health.
            Some(ObjectRef::new(constants::DEFAULT_CONFIG_NAME))
        })
        .shutdown_on_signal()
        .run(reconcile, error_policy, reconciler)
        .for_each(|result| async move {
            match result {
                Ok((obj, _action)) => {
                    debug!(config = %obj.name, "reconciliation complete");
                }
                Err(e) => {
                    // Reconcile errors already went through the error policy;
                    // this also surfaces watch stream errors.
                    warn!(error = %e, "controller stream error");
                }
            }
        })
        .await;

    Ok(())
}
