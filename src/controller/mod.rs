//! # Controller
//!
//! Status aggregation and the reconcile loop for BackplaneConfig resources.

pub mod aggregator;
pub mod backoff;
pub mod components;
pub mod prober;
pub mod reconciler;

pub use aggregator::aggregate;
pub use components::{ComponentReport, ComponentSet, DEFAULT_COMPONENTS, MIN_AVAILABLE_COMPONENTS};
pub use prober::{ComponentInstaller, DeploymentProber};
pub use reconciler::{reconcile, Reconciler, ReconcilerError};
