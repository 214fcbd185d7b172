//! Per-logger counters
//!
//! Tracks how many events a logger emitted, how many were forwarded to an
//! ancestor and how many sink writes failed. Calls below the threshold are not
//! counted; they never touch shared state.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one logger.
///
/// # Example
///
/// ```
/// use rust_logger_registry::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_logged();
/// metrics.record_logged();
/// metrics.record_sink_failure();
///
/// assert_eq!(metrics.total_logged(), 2);
/// assert_eq!(metrics.failure_rate(), 50.0);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Events handed to at least the logger's own sinks
    total_logged: AtomicU64,

    /// Events passed on to an ancestor because the logger is additive
    forwarded_count: AtomicU64,

    /// Individual sink writes that returned an error
    sink_failures: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            total_logged: AtomicU64::new(0),
            forwarded_count: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn total_logged(&self) -> u64 {
        self.total_logged.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn forwarded_count(&self) -> u64 {
        self.forwarded_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    /// Record an emitted event, returning the previous count
    #[inline]
    pub fn record_logged(&self) -> u64 {
        self.total_logged.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_forwarded(&self) -> u64 {
        self.forwarded_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sink_failure(&self) -> u64 {
        self.sink_failures.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of sink writes that failed, as a percentage.
    ///
    /// Returns 0.0 if nothing was written.
    pub fn failure_rate(&self) -> f64 {
        let failures = self.sink_failures() as f64;
        let total = self.total_logged() as f64;
        if total == 0.0 {
            0.0
        } else {
            (failures / total).min(1.0) * 100.0
        }
    }

    pub fn reset(&self) {
        self.total_logged.store(0, Ordering::Relaxed);
        self.forwarded_count.store(0, Ordering::Relaxed);
        self.sink_failures.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Snapshot of the current values
    fn clone(&self) -> Self {
        Self {
            total_logged: AtomicU64::new(self.total_logged()),
            forwarded_count: AtomicU64::new(self.forwarded_count()),
            sink_failures: AtomicU64::new(self.sink_failures()),
        }
    }
}
