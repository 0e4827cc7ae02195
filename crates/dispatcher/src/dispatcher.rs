//! Dispatcher - main loop fanning snapshots out to the emitter and the
//! publish broadcaster

use std::sync::Arc;

use contracts::Snapshot;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::handle::EmitterHandle;
use crate::metrics::EmitterMetricsSnapshot;

/// Broadcast sender the publish endpoint subscribes through
pub type SnapshotSender = broadcast::Sender<Arc<Snapshot>>;

/// Consumes snapshots from the aggregation service and fans each out to the
/// configured emitter and, regardless of emitter outcome, to the publish
/// broadcaster.
pub struct EmitterDispatcher {
    handle: EmitterHandle,
    publish_tx: Option<SnapshotSender>,
    input_rx: mpsc::Receiver<Snapshot>,
}

impl EmitterDispatcher {
    /// Create a dispatcher. `publish_tx` is None when the publish endpoint
    /// is not configured.
    pub fn new(
        handle: EmitterHandle,
        publish_tx: Option<SnapshotSender>,
        input_rx: mpsc::Receiver<Snapshot>,
    ) -> Self {
        Self {
            handle,
            publish_tx,
            input_rx,
        }
    }

    /// Get metrics for the configured emitter
    pub fn metrics(&self) -> (String, EmitterMetricsSnapshot) {
        (
            self.handle.name().to_string(),
            self.handle.metrics().snapshot(),
        )
    }

    /// Run the dispatcher main loop
    ///
    /// Returns when the input channel is closed, after shutting the emitter
    /// worker down.
    pub async fn run(mut self) {
        info!(emitter = %self.handle.name(), "dispatcher started");

        let mut snapshot_count: u64 = 0;

        while let Some(snapshot) = self.input_rx.recv().await {
            snapshot_count += 1;
            let snapshot = Arc::new(snapshot);

            self.handle.try_send(Arc::clone(&snapshot));

            // Forwarded regardless of emitter outcome; no subscribers is fine
            if let Some(publish_tx) = &self.publish_tx {
                if publish_tx.send(snapshot).is_err() {
                    debug!("no publish subscribers for snapshot");
                }
            }
        }

        info!(
            snapshots = snapshot_count,
            "dispatcher input closed, shutting down"
        );

        self.handle.shutdown().await;

        info!("dispatcher shutdown complete");
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }
}
