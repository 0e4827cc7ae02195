//! AdminServer - TCP request/reply loop

use std::sync::Arc;
use std::time::Instant;

use contracts::{DaemonStats, FlushRequest};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::AdminError;
use crate::protocol::{AdminReply, AdminRequest, StatusBody};

/// Shared handles the admin channel operates on.
#[derive(Clone)]
pub struct AdminContext {
    /// Daemon counters, read by `status`
    pub stats: Arc<DaemonStats>,

    /// Flush channel into the aggregation service
    pub flush_tx: mpsc::Sender<FlushRequest>,

    /// Root cancellation token, cancelled by `shutdown`
    pub shutdown: CancellationToken,

    /// Daemon start time, for uptime reporting
    pub started: Instant,
}

/// Serves operator commands over local TCP.
pub struct AdminServer {
    listener: TcpListener,
    context: AdminContext,
    cancel: CancellationToken,
}

impl AdminServer {
    /// Bind the admin listener. Bind failures are fatal at startup.
    pub async fn bind(
        addr: &str,
        context: AdminContext,
        cancel: CancellationToken,
    ) -> Result<Self, AdminError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| AdminError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        info!(addr, "bound admin listener");

        Ok(Self {
            listener,
            context,
            cancel,
        })
    }

    /// Address the listener actually bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until cancellation. Connections are served
    /// concurrently, each in its own task.
    pub async fn run(self) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!(%peer, "admin connection accepted");
                        tokio::spawn(handle_connection(
                            stream,
                            self.context.clone(),
                            self.cancel.clone(),
                        ));
                    }
                    Err(e) => {
                        error!(error = %e, "error accepting admin connection");
                    }
                },
            }
        }
        info!("admin server stopped");
    }

    /// Spawn the accept loop as a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

/// Serve one connection: one JSON request per line, one JSON reply per line.
/// Protocol errors get an error reply and the connection stays open.
async fn handle_connection(stream: TcpStream, context: AdminContext, cancel: CancellationToken) {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    // Peer closed or connection error: done with this client
                    Ok(None) => break,
                    Err(e) => {
                        debug!(error = %e, "admin connection read failed");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                let (reply, shutdown_after) = handle_command(&line, &context).await;

                let mut payload = match serde_json::to_vec(&reply) {
                    Ok(payload) => payload,
                    Err(e) => {
                        error!(error = %e, "failed to serialize admin reply");
                        break;
                    }
                };
                payload.push(b'\n');
                if writer.write_all(&payload).await.is_err() {
                    break;
                }

                if shutdown_after {
                    info!("shutdown requested via admin channel");
                    context.shutdown.cancel();
                    break;
                }
            }
        }
    }
}

/// Execute one command. Returns the reply plus whether the root token is to
/// be cancelled after the reply has been written.
async fn handle_command(line: &str, context: &AdminContext) -> (AdminReply, bool) {
    let request: AdminRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "rejecting admin request");
            return (AdminReply::error(format!("unrecognized command: {e}")), false);
        }
    };

    match request {
        AdminRequest::Status => {
            let body = StatusBody {
                uptime_secs: context.started.elapsed().as_secs(),
                counters: context.stats.report(),
            };
            (AdminReply::Ok { stats: Some(body) }, false)
        }
        AdminRequest::Flush => {
            let (request, done) = FlushRequest::new();
            if context.flush_tx.send(request).await.is_err() {
                return (AdminReply::error("aggregation service not running"), false);
            }
            // Resolves once the snapshot has been handed to the dispatcher
            match done.await {
                Ok(()) => (AdminReply::ok(), false),
                Err(_) => (AdminReply::error("flush did not complete"), false),
            }
        }
        AdminRequest::Shutdown => (AdminReply::ok(), true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt as _;

    async fn start_server() -> (
        std::net::SocketAddr,
        Arc<DaemonStats>,
        mpsc::Receiver<FlushRequest>,
        CancellationToken,
        JoinHandle<()>,
    ) {
        let stats = Arc::new(DaemonStats::new());
        let (flush_tx, flush_rx) = mpsc::channel(4);
        let shutdown = CancellationToken::new();
        let context = AdminContext {
            stats: stats.clone(),
            flush_tx,
            shutdown: shutdown.clone(),
            started: Instant::now(),
        };

        let server = AdminServer::bind("127.0.0.1:0", context, shutdown.clone())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let task = server.spawn();
        (addr, stats, flush_rx, shutdown, task)
    }

    async fn send_line(stream: &mut TcpStream, line: &str) -> String {
        stream.write_all(line.as_bytes()).await.unwrap();
        stream.write_all(b"\n").await.unwrap();
        let mut buf = Vec::new();
        loop {
            let mut byte = [0u8; 1];
            let n = tokio::io::AsyncReadExt::read(stream, &mut byte).await.unwrap();
            assert!(n > 0, "connection closed before reply");
            if byte[0] == b'\n' {
                break;
            }
            buf.push(byte[0]);
        }
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_status_reports_counters_without_mutating() {
        let (addr, stats, _flush_rx, shutdown, task) = start_server().await;
        stats.record_received();
        stats.record_aggregated();
        let before = stats.report();

        let mut stream = TcpStream::connect(addr).await.unwrap();
        let reply = send_line(&mut stream, r#"{"command":"status"}"#).await;
        let reply: AdminReply = serde_json::from_str(&reply).unwrap();

        match reply {
            AdminReply::Ok { stats: Some(body) } => {
                assert_eq!(body.counters.samples_received, 1);
                assert_eq!(body.counters.samples_aggregated, 1);
            }
            other => panic!("expected ok+stats, got {other:?}"),
        }
        // Idempotent: issuing status does not mutate pipeline counters
        assert_eq!(stats.report(), before);

        shutdown.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_flush_acks_after_dispatch() {
        let (addr, _stats, mut flush_rx, shutdown, task) = start_server().await;

        // Stand-in for the aggregation service: ack every flush request
        tokio::spawn(async move {
            while let Some(request) = flush_rx.recv().await {
                let _ = request.done.send(());
            }
        });

        let mut stream = TcpStream::connect(addr).await.unwrap();
        let reply = send_line(&mut stream, r#"{"command":"flush"}"#).await;
        let reply: AdminReply = serde_json::from_str(&reply).unwrap();
        assert_eq!(reply, AdminReply::ok());

        shutdown.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_command_keeps_connection_open() {
        let (addr, _stats, _flush_rx, shutdown, task) = start_server().await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        let reply = send_line(&mut stream, r#"{"command":"restart"}"#).await;
        let reply: AdminReply = serde_json::from_str(&reply).unwrap();
        assert!(matches!(reply, AdminReply::Error { .. }));

        // The same connection still serves valid requests
        let reply = send_line(&mut stream, r#"{"command":"status"}"#).await;
        let reply: AdminReply = serde_json::from_str(&reply).unwrap();
        assert!(matches!(reply, AdminReply::Ok { .. }));

        shutdown.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_cancels_root_token_after_reply() {
        let (addr, _stats, _flush_rx, shutdown, task) = start_server().await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        let reply = send_line(&mut stream, r#"{"command":"shutdown"}"#).await;
        let reply: AdminReply = serde_json::from_str(&reply).unwrap();
        assert_eq!(reply, AdminReply::ok());

        shutdown.cancelled().await;
        task.await.unwrap();
    }
}
