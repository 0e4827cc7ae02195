//! SampleReceiver - datagram socket receive loop

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_channel::Sender;
use contracts::{DaemonStats, MetricSample};
use tokio::net::UnixDatagram;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::decode::decode_message;
use crate::error::{IngestionError, Result};

/// Largest datagram a client may send
const MAX_DATAGRAM_BYTES: usize = 64 * 1024;

/// Nominal datagram size used to convert the message HWM into a kernel
/// receive-buffer byte size
const NOMINAL_DATAGRAM_BYTES: usize = 512;

/// Receiver configuration
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Socket path clients submit to
    pub socket_path: PathBuf,

    /// Octal permissions applied to the socket file
    pub socket_mode: Option<u32>,

    /// Socket-level high-water-mark, in messages
    pub socket_hwm: usize,

    /// Bounded receive poll timeout (cancellation check cadence)
    pub poll_timeout: Duration,
}

/// Receives client submissions from the metrics socket and feeds them into
/// the bounded sample queue.
///
/// The socket queue depth governs backpressure before decoding: once the
/// kernel buffer fills, datagrams are dropped at the transport. The channel
/// push is the internal backpressure point and blocks the receive loop when
/// the aggregation engine falls behind.
pub struct SampleReceiver {
    socket: UnixDatagram,
    config: ReceiverConfig,
    tx: Sender<MetricSample>,
    stats: Arc<DaemonStats>,
    cancel: CancellationToken,
}

impl SampleReceiver {
    /// Bind the ingestion socket and apply socket options.
    ///
    /// A stale socket file from a previous run is removed first. Bind
    /// failures are fatal at startup.
    pub fn bind(
        config: ReceiverConfig,
        tx: Sender<MetricSample>,
        stats: Arc<DaemonStats>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        if config.socket_path.exists() {
            let _ = std::fs::remove_file(&config.socket_path);
        }

        let socket =
            std::os::unix::net::UnixDatagram::bind(&config.socket_path).map_err(|source| {
                IngestionError::Bind {
                    path: config.socket_path.clone(),
                    source,
                }
            })?;

        let rcvbuf = config.socket_hwm.saturating_mul(NOMINAL_DATAGRAM_BYTES);
        socket2::SockRef::from(&socket)
            .set_recv_buffer_size(rcvbuf)
            .map_err(IngestionError::SocketOption)?;

        if let Some(mode) = config.socket_mode {
            std::fs::set_permissions(&config.socket_path, std::fs::Permissions::from_mode(mode))
                .map_err(|source| IngestionError::SocketMode {
                    path: config.socket_path.clone(),
                    mode,
                    source,
                })?;
        }

        socket
            .set_nonblocking(true)
            .map_err(IngestionError::SocketOption)?;
        let socket = UnixDatagram::from_std(socket).map_err(IngestionError::SocketOption)?;

        info!(path = %config.socket_path.display(), hwm = config.socket_hwm, "bound ingestion socket");

        Ok(Self {
            socket,
            config,
            tx,
            stats,
            cancel,
        })
    }

    /// Run the receive loop until cancellation.
    ///
    /// Polls with a bounded timeout so the cancellation signal is observed
    /// promptly; on exit the socket is closed, the socket file removed and a
    /// final received count logged.
    pub async fn run(self) {
        let mut buf = vec![0u8; MAX_DATAGRAM_BYTES];
        let mut received: u64 = 0;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("cancellation observed, stopping receiver");
                    break;
                }
                polled = timeout(self.config.poll_timeout, self.socket.recv_from(&mut buf)) => {
                    let len = match polled {
                        // Poll timeout: loop around to re-check cancellation
                        Err(_) => continue,
                        Ok(Err(e)) => {
                            error!(error = %e, "error reading from socket");
                            continue;
                        }
                        Ok(Ok((len, _addr))) => len,
                    };

                    if !self.ingest_message(&buf[..len], &mut received).await {
                        warn!("sample queue closed, stopping receiver");
                        break;
                    }
                }
            }
        }

        drop(self.socket);
        let _ = std::fs::remove_file(&self.config.socket_path);
        info!(received, "stopped receiving metrics");
    }

    /// Spawn the receive loop as a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Decode one message and enqueue its valid samples.
    ///
    /// Returns false only when the downstream queue has closed.
    async fn ingest_message(&self, data: &[u8], received: &mut u64) -> bool {
        let outcome = match decode_message(data) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.stats.record_decode_error();
                metrics::counter!("ingest_decode_errors").increment(1);
                warn!(
                    error = %e,
                    payload = %String::from_utf8_lossy(&data[..data.len().min(256)]),
                    "dropping malformed client input"
                );
                return true;
            }
        };

        for _ in 0..outcome.rejected {
            self.stats.record_decode_error();
            metrics::counter!("ingest_decode_errors").increment(1);
        }

        for sample in outcome.samples {
            // Blocks when the queue is full: internal backpressure point
            if self.tx.send(sample).await.is_err() {
                return false;
            }
            self.stats.record_received();
            metrics::counter!("ingest_samples_received").increment(1);
            *received += 1;
        }
        true
    }
}
