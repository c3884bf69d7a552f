//! # Backplane Operator
//!
//! A Kubernetes operator managing the lifecycle of a single cluster-scoped
//! `BackplaneConfig` resource. Creating the config triggers installation of
//! the backplane component set; the operator aggregates each component's
//! health into one phase and a set of typed conditions, and a validating
//! webhook protects the config's referential invariants:
//!
//! 1. **Status aggregation** - per-component health reports are folded into
//!    `status.phase` (Progressing/Available/Unavailable) and an `Available`
//!    condition, with deterministic diagnostics naming the first unhealthy
//!    component.
//! 2. **Admission guard** - creation is blocked while a legacy
//!    MultiClusterHub exists; deletion is blocked while dependent resources
//!    (BareMetalAsset, MultiClusterObservability, ManagedCluster) remain in
//!    the cluster. Store errors and timeouts fail closed.
//!
//! The component installers themselves live outside this operator; the
//! shipped installer boundary probes Deployment readiness in the target
//! namespace.

pub mod cli;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod runtime;
pub mod webhook;

pub use crd::{BackplaneConfig, BackplaneConfigSpec, BackplaneConfigStatus, Phase};
