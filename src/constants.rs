//! # Constants
//!
//! Compiled-in defaults for the operator runtime.

/// Well-known name of the singleton BackplaneConfig.
pub const DEFAULT_CONFIG_NAME: &str = "backplane";

/// Namespace the component workloads are installed into by default.
pub const DEFAULT_TARGET_NAMESPACE: &str = "backplane-system";

/// Field manager used for status subresource writes.
pub const FIELD_MANAGER: &str = "backplane-operator";

/// Periodic re-check interval between reconciles, in seconds.
pub const DEFAULT_REQUEUE_SECS: u64 = 60;

/// Maximum attempts for the read-modify-write status update before the
/// reconcile surfaces a conflict error.
pub const MAX_STATUS_UPDATE_ATTEMPTS: u32 = 3;

/// Deadline for a single admission-guard evaluation. Expiry fails closed.
pub const ADMISSION_DEADLINE_SECS: u64 = 10;

/// Default bind address for the webhook/probe HTTP server.
pub const DEFAULT_WEBHOOK_ADDR: &str = "0.0.0.0:8443";

/// How long to wait for the webhook server to bind before giving up.
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 30;

/// Poll interval while waiting for the webhook server to bind.
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 100;

/// Base delay for per-resource Fibonacci error backoff.
pub const BACKOFF_BASE_SECS: u64 = 10;

/// Cap for per-resource Fibonacci error backoff.
pub const BACKOFF_MAX_SECS: u64 = 600;
