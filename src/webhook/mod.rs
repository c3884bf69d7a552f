//! # Validating Webhook
//!
//! Serves the admission guard over HTTP: AdmissionReview requests for
//! BackplaneConfig create/delete operations are translated into guard
//! decisions, plus liveness/readiness probes for the operator pod.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use kube::api::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
use tracing::{error, info};

use crate::crd::BackplaneConfig;

pub mod guard;
pub mod inventory;

pub use guard::{
    AdmissionGuard, AdmissionVerdict, BlockingResource, ClusterInventory, InventoryError,
    ResourceScope, BLOCK_CREATION, BLOCK_DELETION,
};
pub use inventory::KubeInventory;

/// Shared webhook state: the guard plus a readiness flag the probes report.
#[derive(Debug)]
pub struct WebhookState {
    pub guard: AdmissionGuard<KubeInventory>,
    pub is_ready: AtomicBool,
}

impl WebhookState {
    pub fn new(guard: AdmissionGuard<KubeInventory>) -> Self {
        Self {
            guard,
            is_ready: AtomicBool::new(false),
        }
    }
}

/// Build the webhook router.
pub fn router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/validate", post(validate_handler))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .with_state(state)
}

/// Bind and serve the webhook until the process shuts down. Marks the state
/// ready once the listener is bound so readiness probes pass immediately.
pub async fn start_server(addr: SocketAddr, state: Arc<WebhookState>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    state.is_ready.store(true, Ordering::Relaxed);
    info!(%addr, "webhook server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn readyz(State(state): State<Arc<WebhookState>>) -> StatusCode {
    if state.is_ready.load(Ordering::Relaxed) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Handle validating admission review for BackplaneConfig
async fn validate_handler(
    State(state): State<Arc<WebhookState>>,
    Json(body): Json<AdmissionReview<BackplaneConfig>>,
) -> Json<AdmissionReview<DynamicObject>> {
    let req: AdmissionRequest<BackplaneConfig> = match body.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "failed to parse admission request");
            return Json(AdmissionResponse::invalid(e.to_string()).into_review());
        }
    };

    let response = validate(&state, &req).await;
    Json(response.into_review())
}

/// Translate one admission request into a guard decision.
async fn validate(
    state: &WebhookState,
    request: &AdmissionRequest<BackplaneConfig>,
) -> AdmissionResponse {
    let base = AdmissionResponse::from(request);
    let name = request_name(request);

    let verdict = match request.operation {
        Operation::Create => state.guard.authorize_create(&name).await,
        Operation::Delete => state.guard.authorize_delete(&name).await,
        // Spec updates and connect go through unguarded; the reconciler picks
        // them up via the watch.
        _ => AdmissionVerdict::Allow,
    };

    match verdict {
        AdmissionVerdict::Allow => base,
        AdmissionVerdict::Deny(message) => {
            info!(config = %name, operation = ?request.operation, %message, "admission denied");
            base.deny(message)
        }
    }
}

/// Name of the resource under review. Deletes carry it in the request
/// metadata; creates may only have it on the candidate object.
fn request_name(request: &AdmissionRequest<BackplaneConfig>) -> String {
    if !request.name.is_empty() {
        return request.name.clone();
    }
    request
        .object
        .as_ref()
        .and_then(|o| o.metadata.name.clone())
        .unwrap_or_default()
}
