//! # Reconciler
//!
//! Drives the BackplaneConfig state machine: probe component health, feed the
//! reports into the status aggregator, and persist the result when it
//! changed. Triggered by watch events and a periodic requeue.

use crate::constants;
use crate::controller::aggregator::aggregate;
use crate::controller::backoff::BackoffState;
use crate::controller::components::{ComponentReport, ComponentSet};
use crate::controller::prober::ComponentInstaller;
use crate::crd::BackplaneConfig;
use chrono::Utc;
use kube::api::PostParams;
use kube::{Api, Client};
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Errors surfaced from a reconcile pass. Handled by the runtime error
/// policy with backoff; never fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum ReconcilerError {
    /// The resource has no name in metadata (should not happen for a
    /// persisted object)
    #[error("BackplaneConfig has no metadata.name")]
    MissingName,

    /// An error occurred while communicating with the Kubernetes API
    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// An error occurred during JSON serialization
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The read-modify-write status cycle kept losing to a concurrent writer
    #[error("status update conflict not resolved after {0} attempts")]
    StatusConflict(u32),
}

/// Shared reconciler context handed to every reconcile invocation.
pub struct Reconciler {
    pub client: Client,
    pub installer: Box<dyn ComponentInstaller>,
    /// Namespace probed for component workloads when the spec has none
    pub target_namespace: String,
    /// Periodic re-check interval
    pub requeue_interval: Duration,
    /// Per-resource error backoff, consumed by the runtime error policy
    pub backoff_states: std::sync::Mutex<std::collections::HashMap<String, BackoffState>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("target_namespace", &self.target_namespace)
            .field("requeue_interval", &self.requeue_interval)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(client: Client, installer: Box<dyn ComponentInstaller>) -> Self {
        Self {
            client,
            installer,
            target_namespace: constants::DEFAULT_TARGET_NAMESPACE.to_string(),
            requeue_interval: Duration::from_secs(constants::DEFAULT_REQUEUE_SECS),
            backoff_states: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }

    /// Forget accumulated error backoff for a resource after a clean pass.
    pub fn reset_backoff(&self, name: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states.remove(name);
        }
    }
}

/// One reconcile pass for a BackplaneConfig.
pub async fn reconcile(
    config: Arc<BackplaneConfig>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let name = config
        .metadata
        .name
        .as_deref()
        .ok_or(ReconcilerError::MissingName)?;

    debug!(config = name, "reconciling BackplaneConfig");

    let components = ComponentSet::from_spec(&config.spec);
    let reports = ctx.installer.ensure_components(&config, &components).await?;

    update_status(&ctx, name, &components, &reports).await?;

    ctx.reset_backoff(name);
    Ok(Action::requeue(ctx.requeue_interval))
}

/// Persist the aggregated status via the status subresource.
///
/// Read-modify-write with bounded retry on 409: re-read the stored status,
/// recompute the aggregate over it, and reattempt the write. Skips the write
/// entirely when the computed status matches what is stored, to avoid status
/// update storms feeding back into the watch.
async fn update_status(
    ctx: &Reconciler,
    name: &str,
    components: &ComponentSet,
    reports: &[ComponentReport],
) -> Result<(), ReconcilerError> {
    let api: Api<BackplaneConfig> = Api::all(ctx.client.clone());

    for attempt in 1..=constants::MAX_STATUS_UPDATE_ATTEMPTS {
        let latest = api.get(name).await?;
        let current = latest.status_or_default();
        let next = aggregate(
            &current,
            reports,
            components,
            latest.metadata.generation,
            Utc::now(),
        );

        if latest.status.is_some() && next == current {
            debug!(config = name, "status unchanged, skipping write");
            return Ok(());
        }

        if next.phase != current.phase {
            info!(
                config = name,
                from = %current.phase,
                to = %next.phase,
                "phase transition"
            );
        }

        let mut replacement = latest;
        replacement.status = Some(next);

        let params = PostParams {
            field_manager: Some(constants::FIELD_MANAGER.to_string()),
            ..PostParams::default()
        };
        match api
            .replace_status(name, &params, serde_json::to_vec(&replacement)?)
            .await
        {
            Ok(_) => return Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 409 => {
                warn!(
                    config = name,
                    attempt, "status write conflict, re-reading and retrying"
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(ReconcilerError::StatusConflict(
        constants::MAX_STATUS_UPDATE_ATTEMPTS,
    ))
}
