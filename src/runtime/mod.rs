//! # Runtime
//!
//! Operator startup and the long-running watch loop.

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;

pub use error_policy::error_policy;
pub use initialization::{initialize, InitializationResult};
pub use watch_loop::run_watch_loop;
