//! Request accounting.
//!
//! A single counter, advanced once per completed observed request and reset
//! to 1 whenever the push trigger fires. It only feeds log lines; nothing
//! reads it to make decisions.

use axum::http::{Method, StatusCode};
use parking_lot::Mutex;

/// Value the counter starts at and returns to on reset.
pub const COUNTER_START: u64 = 1;

/// One completed request as seen by the observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedRequest {
    pub method: Method,
    pub target: String,
    pub status: StatusCode,
}

/// Process-wide request counter guarded by one mutex.
#[derive(Debug)]
pub struct RequestMetrics {
    counter: Mutex<u64>,
}

impl Default for RequestMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self {
            counter: Mutex::new(COUNTER_START),
        }
    }

    /// Advance the counter and return the new value.
    pub fn increment(&self) -> u64 {
        let mut counter = self.counter.lock();
        *counter += 1;
        *counter
    }

    pub fn reset(&self) {
        *self.counter.lock() = COUNTER_START;
    }

    pub fn snapshot(&self) -> u64 {
        *self.counter.lock()
    }

    /// Log `record` with the current counter value, then advance the counter.
    ///
    /// Both happen under one lock acquisition so the logged value is the one
    /// this request consumed. Returns that value.
    pub fn complete(&self, record: &ObservedRequest, catalog_size: usize) -> u64 {
        let mut counter = self.counter.lock();
        let value = *counter;
        tracing::info!(
            "[{}]: {} {} ({}/{})",
            record.status.as_u16(),
            record.method,
            record.target,
            value,
            catalog_size
        );
        *counter += 1;
        value
    }
}
