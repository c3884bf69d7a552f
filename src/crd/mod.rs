//! # Custom Resource Definitions
//!
//! CRD types for the backplane operator.
//!
//! `BackplaneConfig` is a cluster-scoped singleton: exactly one instance with
//! a well-known name is meaningful per cluster. The admission webhook rejects
//! attempts to create a second instance.
//!
//! # Example
//!
//! ```yaml
//! apiVersion: backplane.open-cluster-management.io/v1alpha1
//! kind: BackplaneConfig
//! metadata:
//!   name: backplane
//! spec: {}
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

mod status;

pub use status::{
    BackplaneConfigStatus, ComponentCondition, ComponentHealth, Condition, Phase,
    CONDITION_AVAILABLE, CONDITION_PROGRESSING,
};

/// BackplaneConfig Custom Resource Definition
///
/// Creating a BackplaneConfig triggers installation of the backplane
/// component set; the operator aggregates each component's health into
/// `status.phase` and `status.conditions`.
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "BackplaneConfig",
    group = "backplane.open-cluster-management.io",
    version = "v1alpha1",
    status = "BackplaneConfigStatus",
    shortname = "bpc",
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}, {"name":"Available", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Available\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct BackplaneConfigSpec {
    /// Per-component overrides. Mapping from component name to enabled flag.
    /// Components absent from the map follow the compiled-in default set.
    #[serde(default)]
    pub overrides: Option<BTreeMap<String, bool>>,
    /// Namespace the component workloads are installed into.
    /// Defaults to the operator's configured target namespace when unset.
    #[serde(default)]
    pub target_namespace: Option<String>,
}

impl BackplaneConfig {
    /// Status of the resource, or the default (empty-phase) status when the
    /// subresource has not been written yet.
    pub fn status_or_default(&self) -> BackplaneConfigStatus {
        self.status.clone().unwrap_or_default()
    }
}
