//! Emitter metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for the configured emitter
#[derive(Debug, Default)]
pub struct EmitterMetrics {
    /// Current queue length
    queue_len: AtomicUsize,
    /// Total successful emissions
    emit_count: AtomicU64,
    /// Total emission failures
    failure_count: AtomicU64,
    /// Total snapshots dropped due to full queue
    dropped_count: AtomicU64,
}

impl EmitterMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current queue length
    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    /// Set current queue length
    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Get total emit count
    pub fn emit_count(&self) -> u64 {
        self.emit_count.load(Ordering::Relaxed)
    }

    /// Increment emit count
    pub fn inc_emit_count(&self) {
        self.emit_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get failure count
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Increment failure count
    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get dropped count
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    /// Increment dropped count
    pub fn inc_dropped_count(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> EmitterMetricsSnapshot {
        EmitterMetricsSnapshot {
            queue_len: self.queue_len(),
            emit_count: self.emit_count(),
            failure_count: self.failure_count(),
            dropped_count: self.dropped_count(),
        }
    }
}

/// Snapshot of emitter metrics (for reporting)
#[derive(Debug, Clone, Copy)]
pub struct EmitterMetricsSnapshot {
    pub queue_len: usize,
    pub emit_count: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
}
