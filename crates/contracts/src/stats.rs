//! Shared daemon counters
//!
//! One instance is shared across receiver, aggregation service and admin
//! channel; reads never mutate pipeline state.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Process-lifetime counters, updated lock-free from the pipeline tasks.
#[derive(Debug, Default)]
pub struct DaemonStats {
    /// Valid samples decoded off the socket
    samples_received: AtomicU64,

    /// Records dropped at decode (malformed message or invalid sample)
    decode_errors: AtomicU64,

    /// Samples folded into an accumulator
    samples_aggregated: AtomicU64,

    /// Queued samples discarded because the shutdown drain grace expired
    samples_discarded: AtomicU64,

    /// Flushes performed (interval, admin and final)
    flushes: AtomicU64,

    /// Non-empty snapshots handed to the dispatcher
    snapshots_dispatched: AtomicU64,
}

impl DaemonStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.samples_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_aggregated(&self) {
        self.samples_aggregated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_discarded(&self, count: u64) {
        self.samples_discarded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_flush(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_snapshot_dispatched(&self) {
        self.snapshots_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn samples_received(&self) -> u64 {
        self.samples_received.load(Ordering::Relaxed)
    }

    pub fn samples_aggregated(&self) -> u64 {
        self.samples_aggregated.load(Ordering::Relaxed)
    }

    /// Get snapshot of all counters
    pub fn report(&self) -> StatsReport {
        StatsReport {
            samples_received: self.samples_received.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            samples_aggregated: self.samples_aggregated.load(Ordering::Relaxed),
            samples_discarded: self.samples_discarded.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            snapshots_dispatched: self.snapshots_dispatched.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`DaemonStats`], serialized into the admin
/// `status` reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsReport {
    pub samples_received: u64,
    pub decode_errors: u64,
    pub samples_aggregated: u64,
    pub samples_discarded: u64,
    pub flushes: u64,
    pub snapshots_dispatched: u64,
}
