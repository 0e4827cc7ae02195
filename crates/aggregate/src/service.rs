//! Aggregation service - the single consumer task
//!
//! Owns the engine, the flush cadence and the shutdown drain.

use std::sync::Arc;
use std::time::Duration;

use async_channel::Receiver as SampleQueue;
use contracts::{DaemonStats, FlushRequest, MetricSample, Snapshot};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::AggregationEngine;

/// Service timing configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Interval between scheduled flushes
    pub flush_interval: Duration,

    /// Grace period for draining queued samples at shutdown
    pub drain_grace: Duration,
}

/// The single logical consumer of the sample queue.
///
/// Folds samples into the engine and flushes on interval ticks, admin
/// requests and exactly once more during graceful shutdown. Snapshot
/// handoff never blocks: a busy dispatcher drops the snapshot with a
/// logged warning instead of stalling the next epoch.
pub struct AggregationService {
    engine: AggregationEngine,
    samples: SampleQueue<MetricSample>,
    flush_requests: mpsc::Receiver<FlushRequest>,
    snapshots: mpsc::Sender<Snapshot>,
    config: ServiceConfig,
    stats: Arc<DaemonStats>,
    cancel: CancellationToken,
}

impl AggregationService {
    pub fn new(
        engine: AggregationEngine,
        samples: SampleQueue<MetricSample>,
        flush_requests: mpsc::Receiver<FlushRequest>,
        snapshots: mpsc::Sender<Snapshot>,
        config: ServiceConfig,
        stats: Arc<DaemonStats>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            engine,
            samples,
            flush_requests,
            snapshots,
            config,
            stats,
            cancel,
        }
    }

    /// Run until cancellation or until every sample producer is gone.
    ///
    /// Shutdown order is strict: drain the queue into the engine within the
    /// grace period, then perform the final flush, then exit (closing the
    /// snapshot channel downstream).
    pub async fn run(self) {
        let Self {
            mut engine,
            samples,
            mut flush_requests,
            snapshots,
            config,
            stats,
            cancel,
        } = self;

        let mut ticker = interval_at(Instant::now() + config.flush_interval, config.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut flush_channel_open = true;

        info!(interval_secs = config.flush_interval.as_secs_f64(), "aggregation service started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("cancellation observed, stopping aggregation");
                    break;
                }
                result = samples.recv() => match result {
                    Ok(sample) => fold(&mut engine, sample, &stats),
                    Err(_) => {
                        debug!("sample queue closed, stopping aggregation");
                        break;
                    }
                },
                _ = ticker.tick() => flush(&mut engine, &snapshots, &stats, "interval"),
                request = flush_requests.recv(), if flush_channel_open => match request {
                    Some(request) => {
                        flush(&mut engine, &snapshots, &stats, "forced");
                        let _ = request.done.send(());
                    }
                    None => flush_channel_open = false,
                },
            }
        }

        drain(&samples, &mut engine, &stats, config.drain_grace).await;
        flush(&mut engine, &snapshots, &stats, "final");
        info!(aggregated = stats.samples_aggregated(), "aggregation service stopped");
    }

    /// Spawn the service as a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

fn fold(engine: &mut AggregationEngine, sample: MetricSample, stats: &DaemonStats) {
    engine.fold(sample);
    stats.record_aggregated();
    metrics::counter!("aggregate_samples_folded").increment(1);
}

/// Take-and-replace the epoch and hand the snapshot to the dispatcher.
fn flush(
    engine: &mut AggregationEngine,
    snapshots: &mpsc::Sender<Snapshot>,
    stats: &DaemonStats,
    reason: &'static str,
) {
    stats.record_flush();
    metrics::counter!("aggregate_flushes", "reason" => reason).increment(1);

    let snapshot = engine.take_snapshot();
    if snapshot.is_empty() {
        debug!(reason, "flush produced no records");
        return;
    }

    let records = snapshot.len();
    match snapshots.try_send(snapshot) {
        Ok(()) => {
            stats.record_snapshot_dispatched();
            info!(reason, records, "snapshot dispatched");
        }
        Err(mpsc::error::TrySendError::Full(_)) => {
            metrics::counter!("aggregate_snapshots_dropped").increment(1);
            warn!(reason, records, "dispatcher busy, snapshot dropped");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            warn!(reason, records, "dispatcher channel closed, snapshot dropped");
        }
    }
}

/// Drain queued-but-unconsumed samples into the engine, bounded by the
/// grace period. Samples still queued at the deadline are discarded and
/// counted.
async fn drain(
    samples: &SampleQueue<MetricSample>,
    engine: &mut AggregationEngine,
    stats: &DaemonStats,
    grace: Duration,
) {
    let deadline = Instant::now() + grace;
    loop {
        match tokio::time::timeout_at(deadline, samples.recv()).await {
            Ok(Ok(sample)) => fold(engine, sample, stats),
            // Queue closed and empty: drain complete
            Ok(Err(_)) => break,
            Err(_) => {
                let discarded = samples.len() as u64;
                stats.record_discarded(discarded);
                metrics::counter!("aggregate_samples_discarded").increment(discarded);
                warn!(discarded, "drain grace period exceeded, discarding queued samples");
                break;
            }
        }
    }
}
