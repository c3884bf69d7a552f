//! # CLI
//!
//! Command-line arguments for the operator binary.

use crate::constants;
use clap::Parser;
use std::net::SocketAddr;

/// Operator runtime configuration.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "backplane-operator",
    about = "Installs the backplane component set and aggregates its health"
)]
pub struct OperatorArgs {
    /// Bind address for the admission webhook and probe endpoints
    #[arg(long, default_value = constants::DEFAULT_WEBHOOK_ADDR)]
    pub webhook_addr: SocketAddr,

    /// Namespace the component workloads are installed into
    #[arg(long, default_value = constants::DEFAULT_TARGET_NAMESPACE)]
    pub target_namespace: String,

    /// Seconds between periodic component health re-checks
    #[arg(long, default_value_t = constants::DEFAULT_REQUEUE_SECS)]
    pub poll_interval_secs: u64,
}
