//! # Resource Store Adapter
//!
//! Kubernetes-backed implementation of [`ClusterInventory`]: presence probes
//! over dynamic objects, with a missing CRD mapped to "no instances exist".

use crate::crd::BackplaneConfig;
use crate::webhook::guard::{BlockingResource, ClusterInventory, InventoryError, ResourceScope};
use async_trait::async_trait;
use kube::api::{Api, DynamicObject, ListParams};
use kube::core::{ApiResource, GroupVersionKind};
use kube::Client;

/// Cluster inventory backed by the live API server.
#[derive(Clone)]
pub struct KubeInventory {
    client: Client,
}

impl std::fmt::Debug for KubeInventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeInventory").finish_non_exhaustive()
    }
}

impl KubeInventory {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn dynamic_api(&self, entry: &BlockingResource) -> Api<DynamicObject> {
        let gvk = GroupVersionKind::gvk(entry.group, entry.version, entry.kind);
        let resource = ApiResource::from_gvk_with_plural(&gvk, entry.plural);
        match entry.scope {
            ResourceScope::Namespaced(Some(namespace)) => {
                Api::namespaced_with(self.client.clone(), namespace, &resource)
            }
            // Cluster-scoped kinds and unscoped namespaced kinds both list
            // cluster-wide.
            ResourceScope::Cluster | ResourceScope::Namespaced(None) => {
                Api::all_with(self.client.clone(), &resource)
            }
        }
    }
}

#[async_trait]
impl ClusterInventory for KubeInventory {
    async fn count_instances(
        &self,
        entry: &BlockingResource,
    ) -> Result<Option<usize>, InventoryError> {
        let api = self.dynamic_api(entry);
        // A single item is enough to veto; don't page the whole collection.
        let params = ListParams::default().limit(1);
        match api.list(&params).await {
            Ok(list) => Ok(Some(list.items.len())),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn existing_config_names(&self) -> Result<Vec<String>, InventoryError> {
        let api: Api<BackplaneConfig> = Api::all(self.client.clone());
        let list = match api.list(&ListParams::default()).await {
            Ok(list) => list,
            // Our own CRD not being registered yet means no instances.
            Err(kube::Error::Api(ae)) if ae.code == 404 => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(list
            .items
            .into_iter()
            .filter_map(|c| c.metadata.name)
            .collect())
    }
}
