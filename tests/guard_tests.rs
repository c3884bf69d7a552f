//! # Admission Guard Tests
//!
//! Exercises the create/delete guard against a fake cluster inventory,
//! mirroring the install-test scenarios: blocking resources veto the
//! operation with their configured message, and removing them unblocks it.

use async_trait::async_trait;
use backplane_operator::webhook::{
    AdmissionGuard, BlockingResource, ClusterInventory, InventoryError, BLOCK_CREATION,
    BLOCK_DELETION,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// In-memory stand-in for the cluster: kind -> instance count, where a
/// missing key models a kind whose CRD is not installed.
#[derive(Default)]
struct FakeInventory {
    instances: Mutex<HashMap<&'static str, usize>>,
    configs: Mutex<Vec<String>>,
    fail_transport: Mutex<bool>,
    delay: Mutex<Option<Duration>>,
}

impl FakeInventory {
    fn with_all_crds_installed() -> Self {
        let fake = Self::default();
        {
            let mut instances = fake.instances.lock().unwrap();
            for entry in BLOCK_CREATION.iter().chain(BLOCK_DELETION) {
                instances.insert(entry.kind, 0);
            }
        }
        fake
    }

    fn add(&self, kind: &'static str) {
        *self.instances.lock().unwrap().entry(kind).or_insert(0) += 1;
    }

    fn remove_all(&self, kind: &'static str) {
        self.instances.lock().unwrap().insert(kind, 0);
    }

    fn add_config(&self, name: &str) {
        self.configs.lock().unwrap().push(name.to_string());
    }

    fn set_transport_failure(&self, fail: bool) {
        *self.fail_transport.lock().unwrap() = fail;
    }

    fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl ClusterInventory for FakeInventory {
    async fn count_instances(
        &self,
        entry: &BlockingResource,
    ) -> Result<Option<usize>, InventoryError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.fail_transport.lock().unwrap() {
            return Err(InventoryError::Transport(
                "connection refused".to_string(),
            ));
        }
        Ok(self.instances.lock().unwrap().get(entry.kind).copied())
    }

    async fn existing_config_names(&self) -> Result<Vec<String>, InventoryError> {
        if *self.fail_transport.lock().unwrap() {
            return Err(InventoryError::Transport(
                "connection refused".to_string(),
            ));
        }
        Ok(self.configs.lock().unwrap().clone())
    }
}

#[tokio::test]
async fn create_is_allowed_on_an_empty_cluster() {
    let guard = AdmissionGuard::new(FakeInventory::with_all_crds_installed());
    let verdict = guard.authorize_create("backplane").await;
    assert!(verdict.is_allowed(), "got {verdict:?}");
}

#[tokio::test]
async fn each_block_creation_entry_vetoes_create_until_deleted() {
    for entry in BLOCK_CREATION {
        let inventory = FakeInventory::with_all_crds_installed();
        inventory.add(entry.kind);
        let guard = AdmissionGuard::new(inventory);

        let verdict = guard.authorize_create("test").await;
        assert!(!verdict.is_allowed(), "{} should block creation", entry.kind);
        assert!(
            verdict.message().unwrap().contains(entry.message),
            "rejection should carry the configured message, got {:?}",
            verdict.message()
        );
    }
}

#[tokio::test]
async fn multiclusterhub_rejection_message_matches() {
    let inventory = FakeInventory::with_all_crds_installed();
    inventory.add("MultiClusterHub");
    let guard = AdmissionGuard::new(inventory);

    let verdict = guard.authorize_create("test").await;
    assert!(verdict
        .message()
        .unwrap()
        .contains("Existing MultiClusterHub resources must first be deleted"));
}

#[tokio::test]
async fn deleting_the_blocker_unblocks_creation() {
    let inventory = FakeInventory::with_all_crds_installed();
    inventory.add("MultiClusterHub");
    let guard = AdmissionGuard::new(inventory);

    assert!(!guard.authorize_create("test").await.is_allowed());

    // Retry after the blocking resource is gone.
    // The guard is a pure function of current store contents.
    // (Same guard instance, mutated store.)
    guard_inventory(&guard).remove_all("MultiClusterHub");
    assert!(guard.authorize_create("test").await.is_allowed());
}

#[tokio::test]
async fn each_block_deletion_entry_vetoes_delete_until_deleted() {
    for entry in BLOCK_DELETION {
        let inventory = FakeInventory::with_all_crds_installed();
        inventory.add(entry.kind);
        let guard = AdmissionGuard::new(inventory);

        let verdict = guard.authorize_delete("backplane").await;
        assert!(!verdict.is_allowed(), "{} should block deletion", entry.kind);
        assert!(verdict.message().unwrap().contains(entry.message));

        guard_inventory(&guard).remove_all(entry.kind);
        assert!(
            guard.authorize_delete("backplane").await.is_allowed(),
            "delete should succeed once {} instances are gone",
            entry.kind
        );
    }
}

#[tokio::test]
async fn managedcluster_rejection_message_matches() {
    let inventory = FakeInventory::with_all_crds_installed();
    inventory.add("ManagedCluster");
    let guard = AdmissionGuard::new(inventory);

    let verdict = guard.authorize_delete("backplane").await;
    assert!(verdict
        .message()
        .unwrap()
        .contains("Existing ManagedCluster resources must first be deleted"));
}

#[tokio::test]
async fn decisions_are_idempotent_against_unchanged_store() {
    let inventory = FakeInventory::with_all_crds_installed();
    inventory.add("BareMetalAsset");
    let guard = AdmissionGuard::new(inventory);

    let first = guard.authorize_delete("backplane").await;
    let second = guard.authorize_delete("backplane").await;
    assert_eq!(first, second);

    let create_first = guard.authorize_create("backplane").await;
    let create_second = guard.authorize_create("backplane").await;
    assert_eq!(create_first, create_second);
}

#[tokio::test]
async fn missing_crd_counts_as_no_instances() {
    // Nothing registered at all: every lookup returns "CRD not installed",
    // which must be treated as absence, not as an error.
    let guard = AdmissionGuard::new(FakeInventory::default());
    assert!(guard.authorize_create("backplane").await.is_allowed());
    assert!(guard.authorize_delete("backplane").await.is_allowed());
}

#[tokio::test]
async fn transport_errors_fail_closed() {
    let inventory = FakeInventory::with_all_crds_installed();
    inventory.set_transport_failure(true);
    let guard = AdmissionGuard::new(inventory);

    let create = guard.authorize_create("backplane").await;
    assert!(!create.is_allowed(), "store failure must reject create");

    let delete = guard.authorize_delete("backplane").await;
    assert!(!delete.is_allowed(), "store failure must reject delete");
    assert!(delete.message().unwrap().contains("request denied"));
}

#[tokio::test]
async fn deadline_expiry_fails_closed() {
    let inventory = FakeInventory::with_all_crds_installed();
    inventory.set_delay(Duration::from_secs(5));
    let guard = AdmissionGuard::new(inventory).with_deadline(Duration::from_millis(50));

    let verdict = guard.authorize_delete("backplane").await;
    assert!(!verdict.is_allowed(), "timeout must reject, never allow");
    assert!(verdict.message().unwrap().contains("deadline"));
}

#[tokio::test]
async fn second_config_instance_is_rejected() {
    let inventory = FakeInventory::with_all_crds_installed();
    inventory.add_config("backplane");
    let guard = AdmissionGuard::new(inventory);

    let verdict = guard.authorize_create("test").await;
    assert!(!verdict.is_allowed());
    assert!(verdict.message().unwrap().contains("only one"));
}

/// Access the guard's inventory for store mutation mid-test.
fn guard_inventory(guard: &AdmissionGuard<FakeInventory>) -> &FakeInventory {
    guard.inventory()
}
