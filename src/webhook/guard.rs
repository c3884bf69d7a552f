//! # Admission Guard
//!
//! Synchronous create/delete admission decisions for BackplaneConfig.
//!
//! Creation is blocked while a conflicting legacy resource exists; deletion
//! is blocked while dependent resources the config manages still exist
//! anywhere in the cluster. Both checks walk a compiled-in, ordered table of
//! blocking-resource descriptors so rejection messages are deterministic.
//!
//! Store errors and deadline expiry fail closed: the invariants being
//! protected are duplicate-ownership and orphaned-dependent prevention, so a
//! guard that cannot see the cluster must reject.

use crate::constants;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// Listing scope for a blocking-resource check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceScope {
    /// Cluster-scoped kind
    Cluster,
    /// Namespaced kind; `None` lists across all namespaces
    Namespaced(Option<&'static str>),
}

/// Static descriptor for a resource kind whose presence vetoes a specific
/// BackplaneConfig operation.
#[derive(Debug, Clone, Copy)]
pub struct BlockingResource {
    pub kind: &'static str,
    pub group: &'static str,
    pub version: &'static str,
    pub plural: &'static str,
    pub scope: ResourceScope,
    /// Rejection message surfaced verbatim to the requester
    pub message: &'static str,
}

/// Resources whose presence forbids creating a BackplaneConfig.
pub const BLOCK_CREATION: &[BlockingResource] = &[BlockingResource {
    kind: "MultiClusterHub",
    group: "operator.open-cluster-management.io",
    version: "v1",
    plural: "multiclusterhubs",
    scope: ResourceScope::Namespaced(None),
    message: "Existing MultiClusterHub resources must first be deleted",
}];

/// Resources whose presence forbids deleting the BackplaneConfig.
pub const BLOCK_DELETION: &[BlockingResource] = &[
    BlockingResource {
        kind: "BareMetalAsset",
        group: "inventory.open-cluster-management.io",
        version: "v1alpha1",
        plural: "baremetalassets",
        scope: ResourceScope::Namespaced(None),
        message: "Existing BareMetalAsset resources must first be deleted",
    },
    BlockingResource {
        kind: "MultiClusterObservability",
        group: "observability.open-cluster-management.io",
        version: "v1beta2",
        plural: "multiclusterobservabilities",
        scope: ResourceScope::Cluster,
        message: "Existing MultiClusterObservability resources must first be deleted",
    },
    BlockingResource {
        kind: "ManagedCluster",
        group: "cluster.open-cluster-management.io",
        version: "v1",
        plural: "managedclusters",
        scope: ResourceScope::Cluster,
        message: "Existing ManagedCluster resources must first be deleted",
    },
];

/// Errors from the resource-store adapter backing the guard.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    /// An error occurred while communicating with the Kubernetes API
    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Transport-level failure distinct from NotFound
    #[error("resource store unavailable: {0}")]
    Transport(String),
}

/// Read-only view of cluster contents the guard consults.
///
/// `count_instances` returns `Ok(None)` when the kind's CRD is not installed;
/// the dependent feature is simply absent and the entry is skipped.
#[async_trait]
pub trait ClusterInventory: Send + Sync {
    async fn count_instances(
        &self,
        entry: &BlockingResource,
    ) -> Result<Option<usize>, InventoryError>;

    /// Names of BackplaneConfig resources currently in the cluster.
    async fn existing_config_names(&self) -> Result<Vec<String>, InventoryError>;
}

/// Outcome of an admission decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionVerdict {
    Allow,
    Deny(String),
}

impl AdmissionVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AdmissionVerdict::Allow)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            AdmissionVerdict::Allow => None,
            AdmissionVerdict::Deny(msg) => Some(msg),
        }
    }
}

/// The guard itself: a pure function of current store contents, evaluated
/// under a deadline.
#[derive(Debug)]
pub struct AdmissionGuard<I> {
    inventory: I,
    deadline: Duration,
}

impl<I: ClusterInventory> AdmissionGuard<I> {
    pub fn new(inventory: I) -> Self {
        Self {
            inventory,
            deadline: Duration::from_secs(constants::ADMISSION_DEADLINE_SECS),
        }
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// The inventory backing this guard.
    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    /// Decide whether a BackplaneConfig named `candidate_name` may be
    /// created.
    pub async fn authorize_create(&self, candidate_name: &str) -> AdmissionVerdict {
        let evaluation = async {
            // Exactly one BackplaneConfig is meaningful per cluster.
            match self.inventory.existing_config_names().await {
                Ok(names) => {
                    if let Some(existing) =
                        names.iter().find(|existing| existing.as_str() != candidate_name)
                    {
                        return AdmissionVerdict::Deny(format!(
                            "a BackplaneConfig named {existing} already exists; only one \
                             instance is allowed per cluster"
                        ));
                    }
                }
                Err(e) => return fail_closed("create", &e),
            }

            self.check_table(BLOCK_CREATION, "create").await
        };

        self.with_timeout("create", evaluation).await
    }

    /// Decide whether the existing BackplaneConfig may be deleted.
    pub async fn authorize_delete(&self, name: &str) -> AdmissionVerdict {
        debug!(config = name, "evaluating delete admission");
        self.with_timeout("delete", self.check_table(BLOCK_DELETION, "delete"))
            .await
    }

    /// Walk a blocking table in order and reject on the first entry with a
    /// live instance. Missing CRDs count as zero instances.
    async fn check_table(&self, table: &[BlockingResource], operation: &str) -> AdmissionVerdict {
        for entry in table {
            match self.inventory.count_instances(entry).await {
                Ok(Some(count)) if count > 0 => {
                    debug!(
                        kind = entry.kind,
                        count, operation, "blocking resource present, rejecting"
                    );
                    return AdmissionVerdict::Deny(entry.message.to_string());
                }
                Ok(Some(_)) => {}
                Ok(None) => {
                    debug!(kind = entry.kind, "CRD not installed, skipping check");
                }
                Err(e) => return fail_closed(operation, &e),
            }
        }
        AdmissionVerdict::Allow
    }

    async fn with_timeout(
        &self,
        operation: &str,
        evaluation: impl std::future::Future<Output = AdmissionVerdict>,
    ) -> AdmissionVerdict {
        match tokio::time::timeout(self.deadline, evaluation).await {
            Ok(verdict) => verdict,
            Err(_) => {
                warn!(operation, "admission evaluation exceeded deadline, failing closed");
                AdmissionVerdict::Deny(format!(
                    "unable to verify cluster state for {operation} within the deadline; \
                     request denied"
                ))
            }
        }
    }
}

/// A guard that cannot read the store must reject, never allow.
fn fail_closed(operation: &str, error: &InventoryError) -> AdmissionVerdict {
    warn!(operation, error = %error, "admission check failed closed");
    AdmissionVerdict::Deny(format!(
        "unable to verify cluster state for {operation}: {error}; request denied"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocking_tables_are_ordered_and_messaged() {
        assert_eq!(BLOCK_CREATION.len(), 1);
        assert_eq!(BLOCK_CREATION[0].kind, "MultiClusterHub");

        let kinds: Vec<&str> = BLOCK_DELETION.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec!["BareMetalAsset", "MultiClusterObservability", "ManagedCluster"]
        );
        for entry in BLOCK_CREATION.iter().chain(BLOCK_DELETION) {
            assert!(
                entry.message.contains(entry.kind),
                "message must name the offending kind: {}",
                entry.message
            );
            assert!(entry.message.contains("must first be deleted"));
        }
    }

    #[test]
    fn verdict_accessors() {
        assert!(AdmissionVerdict::Allow.is_allowed());
        assert!(AdmissionVerdict::Allow.message().is_none());

        let deny = AdmissionVerdict::Deny("nope".to_string());
        assert!(!deny.is_allowed());
        assert_eq!(deny.message(), Some("nope"));
    }
}
