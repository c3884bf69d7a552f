//! # Initialization
//!
//! Operator startup: rustls setup, tracing, Kubernetes client, reconciler
//! context, webhook server, and the pass over pre-existing resources.

use crate::cli::OperatorArgs;
use crate::constants;
use crate::controller::{reconcile, DeploymentProber, Reconciler};
use crate::crd::BackplaneConfig;
use crate::webhook::{start_server, AdmissionGuard, KubeInventory, WebhookState};
use anyhow::Result;
use kube::{api::Api, api::ListParams, Client};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Everything the watch loop needs, produced by [`initialize`].
pub struct InitializationResult {
    /// Kubernetes client
    pub client: Client,
    /// API for the cluster-scoped BackplaneConfig CRD
    pub configs: Api<BackplaneConfig>,
    /// Reconciler context
    pub reconciler: Arc<Reconciler>,
    /// Webhook state, shared with the running server
    pub webhook: Arc<WebhookState>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult").finish_non_exhaustive()
    }
}

/// Initialize the operator runtime.
///
/// Handles rustls crypto provider setup, tracing subscriber setup, client
/// creation, webhook server startup, and reconciling resources that existed
/// before the operator came up.
pub async fn initialize(args: &OperatorArgs) -> Result<InitializationResult> {
    // Configure rustls crypto provider FIRST, before any other operations.
    // Required for rustls 0.23+ when no default provider is set via features.
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backplane_operator=info".into()),
        )
        .init();

    info!(
        target_namespace = %args.target_namespace,
        webhook_addr = %args.webhook_addr,
        "starting backplane operator"
    );

    let client = Client::try_default().await?;
    let configs: Api<BackplaneConfig> = Api::all(client.clone());

    let installer = DeploymentProber::new(client.clone(), args.target_namespace.clone());
    let mut reconciler = Reconciler::new(client.clone(), Box::new(installer));
    reconciler.target_namespace = args.target_namespace.clone();
    reconciler.requeue_interval = Duration::from_secs(args.poll_interval_secs);
    let reconciler = Arc::new(reconciler);

    // The guard reads the same cluster the reconciler writes; it only ever
    // lists, so running it concurrently with reconciliation is safe.
    let guard = AdmissionGuard::new(KubeInventory::new(client.clone()));
    let webhook = Arc::new(WebhookState::new(guard));

    let webhook_clone = webhook.clone();
    let addr = args.webhook_addr;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(addr, webhook_clone).await {
            error!(error = %e, "webhook server error");
        }
    });

    wait_for_server_ready(&webhook, &server_handle).await?;

    // Resources created before the operator deployed won't produce watch
    // events, so reconcile them explicitly before starting the watch.
    reconcile_existing_resources(&configs, &reconciler).await?;

    info!("operator initialized, starting watch loop");

    Ok(InitializationResult {
        client,
        configs,
        reconciler,
        webhook,
    })
}

/// Wait for the webhook server to bind.
async fn wait_for_server_ready(
    webhook: &Arc<WebhookState>,
    server_handle: &tokio::task::JoinHandle<()>,
) -> Result<()> {
    let startup_timeout = Duration::from_secs(constants::DEFAULT_SERVER_STARTUP_TIMEOUT_SECS);
    let poll_interval = Duration::from_millis(constants::DEFAULT_SERVER_POLL_INTERVAL_MS);
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("webhook server failed to start"));
        }

        if webhook.is_ready.load(Ordering::Relaxed) {
            info!("webhook server is ready and accepting connections");
            return Ok(());
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "webhook server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }
}

/// Reconcile BackplaneConfig resources that already exist in the cluster.
async fn reconcile_existing_resources(
    configs: &Api<BackplaneConfig>,
    reconciler: &Arc<Reconciler>,
) -> Result<()> {
    match configs.list(&ListParams::default()).await {
        Ok(list) => {
            info!(
                count = list.items.len(),
                "found existing BackplaneConfig resources"
            );
            for item in list.items {
                let name = item.metadata.name.as_deref().unwrap_or("unknown").to_string();
                match reconcile(Arc::new(item), reconciler.clone()).await {
                    Ok(_action) => info!(config = %name, "reconciled existing resource"),
                    Err(e) => {
                        // Continue with other resources; the watch will retry.
                        error!(config = %name, error = %e, "failed to reconcile existing resource");
                    }
                }
            }
        }
        Err(e) => {
            error!(error = %e, "CRD is not queryable; is the BackplaneConfig CRD installed?");
            warn!("continuing despite CRD queryability check failure, the watch will retry");
        }
    }

    Ok(())
}
