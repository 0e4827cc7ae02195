//! EmitterHandle - manages an emitter with isolated queue and worker task

use std::sync::Arc;

use contracts::{Emitter, Snapshot};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::metrics::EmitterMetrics;

/// Handle to a running emitter worker
pub struct EmitterHandle {
    /// Emitter name
    name: String,
    /// Channel to send snapshots to worker
    tx: mpsc::Sender<Arc<Snapshot>>,
    /// Shared metrics
    metrics: Arc<EmitterMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl EmitterHandle {
    /// Create a new EmitterHandle and spawn the worker task
    pub fn spawn<E: Emitter + Send + 'static>(emitter: E, queue_capacity: usize) -> Self {
        let name = emitter.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity);
        let metrics = Arc::new(EmitterMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            emitter_worker(emitter, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    /// Get emitter name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<EmitterMetrics> {
        &self.metrics
    }

    /// Send a snapshot to the emitter (non-blocking)
    ///
    /// Returns true if sent, false if queue full (snapshot dropped)
    pub fn try_send(&self, snapshot: Arc<Snapshot>) -> bool {
        match self.tx.try_send(snapshot) {
            Ok(()) => {
                self.metrics.set_queue_len(self.tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(s)) => {
                self.metrics.inc_dropped_count();
                warn!(
                    emitter = %self.name,
                    records = s.len(),
                    "queue full, snapshot dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(emitter = %self.name, "emitter worker closed unexpectedly");
                false
            }
        }
    }

    /// Shutdown the emitter worker gracefully
    pub async fn shutdown(self) {
        // Drop sender to signal worker to stop
        drop(self.tx);
        // Wait for worker to finish
        if let Err(e) = self.worker_handle.await {
            error!(emitter = %self.name, error = ?e, "worker task panicked");
        }
        debug!(emitter = %self.name, "EmitterHandle shutdown complete");
    }
}

/// Worker task that consumes snapshots and drives the emitter
async fn emitter_worker<E: Emitter>(
    mut emitter: E,
    mut rx: mpsc::Receiver<Arc<Snapshot>>,
    metrics: Arc<EmitterMetrics>,
    name: String,
) {
    debug!(emitter = %name, "emitter worker started");

    while let Some(snapshot) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        match emitter.emit(&snapshot).await {
            Ok(()) => {
                metrics.inc_emit_count();
            }
            Err(e) => {
                metrics.inc_failure_count();
                error!(
                    emitter = %name,
                    records = snapshot.len(),
                    error = %e,
                    "emit failed"
                );
                // Non-fatal: the next epoch proceeds, no retry
            }
        }
    }

    if let Err(e) = emitter.close().await {
        error!(emitter = %name, error = %e, "close failed on shutdown");
    }

    debug!(emitter = %name, "emitter worker stopped");
}
