//! # Backoff
//!
//! Fibonacci backoff for reconciliation errors, tracked per resource so one
//! failing config cannot inflate another's retry delay.

/// Fibonacci sequence of delays, scaled by a base and capped at a maximum.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    base_secs: u64,
    max_secs: u64,
    prev: u64,
    curr: u64,
}

impl FibonacciBackoff {
    pub fn new(base_secs: u64, max_secs: u64) -> Self {
        Self {
            base_secs,
            max_secs,
            prev: 0,
            curr: 1,
        }
    }

    /// Next delay in seconds, advancing the sequence.
    pub fn next_backoff_seconds(&mut self) -> u64 {
        let delay = (self.curr * self.base_secs).min(self.max_secs);
        let next = self.prev + self.curr;
        self.prev = self.curr;
        self.curr = next;
        delay
    }
}

/// Per-resource error bookkeeping used by the runtime error policy.
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    pub fn new(base_secs: u64, max_secs: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(base_secs, max_secs),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }
}
