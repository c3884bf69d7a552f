//! # Error Policy
//!
//! Error handling and backoff for the controller watch loop. Reconciliation
//! errors requeue with per-resource Fibonacci backoff; they never terminate
//! the process.

use crate::constants;
use crate::controller::backoff::BackoffState;
use crate::controller::{Reconciler, ReconcilerError};
use crate::crd::BackplaneConfig;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// Handle a reconciliation error by scheduling a backed-off requeue.
///
/// Backoff state is tracked per resource so many failing configs do not
/// interfere with each other's retry schedule.
pub fn error_policy(
    obj: Arc<BackplaneConfig>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let name = obj.metadata.name.as_deref().unwrap_or("unknown");
    error!(config = name, %error, "reconciliation error");

    let delay_secs = match ctx.backoff_states.lock() {
        Ok(mut states) => {
            let state = states.entry(name.to_string()).or_insert_with(|| {
                BackoffState::new(constants::BACKOFF_BASE_SECS, constants::BACKOFF_MAX_SECS)
            });
            state.increment_error();
            let delay = state.backoff.next_backoff_seconds();
            warn!(
                config = name,
                error_count = state.error_count,
                delay_secs = delay,
                "requeueing with backoff"
            );
            delay
        }
        Err(e) => {
            warn!(config = name, error = %e, "backoff state lock poisoned, using base delay");
            constants::BACKOFF_BASE_SECS
        }
    };

    Action::requeue(Duration::from_secs(delay_secs))
}
