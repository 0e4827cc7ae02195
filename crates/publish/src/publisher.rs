//! SnapshotPublisher - push-style socket fanning snapshots out to subscribers

use std::path::PathBuf;
use std::sync::Arc;

use contracts::Snapshot;
use tokio::io::AsyncWriteExt;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::PublishError;

/// Snapshots buffered per subscriber before lagging sets in
pub const SNAPSHOT_FANOUT_CAPACITY: usize = 16;

/// Publishes each dispatched snapshot to zero or more external subscribers.
///
/// Subscribers connect to the socket and receive one line per snapshot: the
/// JSON array of emitted records, content-identical to what the emitter
/// received.
pub struct SnapshotPublisher {
    listener: UnixListener,
    path: PathBuf,
    tx: broadcast::Sender<Arc<Snapshot>>,
    cancel: CancellationToken,
}

impl SnapshotPublisher {
    /// Bind the publish socket. A stale socket file is removed first; bind
    /// failures are fatal at startup.
    pub fn bind(path: PathBuf, cancel: CancellationToken) -> Result<Self, PublishError> {
        if path.exists() {
            let _ = std::fs::remove_file(&path);
        }

        let listener = UnixListener::bind(&path).map_err(|source| PublishError::Bind {
            path: path.clone(),
            source,
        })?;

        let (tx, _) = broadcast::channel(SNAPSHOT_FANOUT_CAPACITY);

        info!(path = %path.display(), "bound publish socket");

        Ok(Self {
            listener,
            path,
            tx,
            cancel,
        })
    }

    /// The sender the dispatcher publishes snapshots through.
    pub fn sender(&self) -> broadcast::Sender<Arc<Snapshot>> {
        self.tx.clone()
    }

    /// Accept subscribers until cancellation.
    pub async fn run(self) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _addr)) => {
                        debug!("subscriber connected");
                        metrics::counter!("publish_subscribers_connected").increment(1);
                        tokio::spawn(subscriber_task(
                            stream,
                            self.tx.subscribe(),
                            self.cancel.clone(),
                        ));
                    }
                    Err(e) => {
                        error!(error = %e, "error accepting subscriber");
                    }
                },
            }
        }

        drop(self.listener);
        let _ = std::fs::remove_file(&self.path);
        info!("publisher stopped");
    }

    /// Spawn the accept loop as a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

/// Writer task for one subscriber. Lagging drops snapshots for this
/// subscriber only; a write error disconnects this subscriber only.
async fn subscriber_task(
    mut stream: UnixStream,
    mut rx: broadcast::Receiver<Arc<Snapshot>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            received = rx.recv() => match received {
                Ok(snapshot) => {
                    let mut line = match serde_json::to_vec(&snapshot.records) {
                        Ok(line) => line,
                        Err(e) => {
                            error!(error = %e, "failed to serialize snapshot for publish");
                            continue;
                        }
                    };
                    line.push(b'\n');
                    if let Err(e) = stream.write_all(&line).await {
                        debug!(error = %e, "subscriber disconnected");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    metrics::counter!("publish_snapshots_dropped").increment(skipped);
                    warn!(skipped, "slow subscriber, snapshots dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}
