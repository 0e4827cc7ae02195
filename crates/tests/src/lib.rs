//! # Integration Tests
//!
//! End-to-end tests over real sockets: datagram ingestion through
//! aggregation and dispatch to a capturing emitter, admin control over TCP
//! and snapshot broadcast to subscribers.

#[cfg(test)]
mod e2e_tests {
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use admin::{AdminContext, AdminReply, AdminServer};
    use aggregate::{AggregationEngine, AggregationService, ServiceConfig};
    use contracts::{
        ContractError, DaemonStats, Emitter, EmittedValue, FlushRequest, MetricKind, Snapshot,
    };
    use dispatcher::{EmitterDispatcher, EmitterHandle};
    use ingestion::{ReceiverConfig, SampleReceiver};
    use publish::SnapshotPublisher;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::sync::mpsc;
    use tokio::task::JoinHandle;
    use tokio_util::sync::CancellationToken;

    /// Emitter that captures every snapshot it is handed.
    struct CapturingEmitter {
        snapshots: Arc<Mutex<Vec<Snapshot>>>,
    }

    impl Emitter for CapturingEmitter {
        fn name(&self) -> &str {
            "capturing"
        }

        async fn emit(&mut self, snapshot: &Snapshot) -> Result<(), ContractError> {
            self.snapshots.lock().unwrap().push(snapshot.clone());
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    struct Pipeline {
        client: std::os::unix::net::UnixDatagram,
        flush_tx: mpsc::Sender<FlushRequest>,
        stats: Arc<DaemonStats>,
        cancel: CancellationToken,
        snapshots: Arc<Mutex<Vec<Snapshot>>>,
        handles: Vec<JoinHandle<()>>,
        _dir: tempfile::TempDir,
    }

    /// Wire receiver -> service -> dispatcher -> capturing emitter over a
    /// real datagram socket, optionally with a publish endpoint.
    fn start_pipeline(publish: bool) -> (Pipeline, Option<std::path::PathBuf>) {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("metrics.sock");
        let cancel = CancellationToken::new();
        let stats = Arc::new(DaemonStats::new());
        let snapshots = Arc::new(Mutex::new(Vec::new()));

        let (sample_tx, sample_rx) = async_channel::bounded(1000);
        let receiver = SampleReceiver::bind(
            ReceiverConfig {
                socket_path: socket_path.clone(),
                socket_mode: None,
                socket_hwm: 1000,
                poll_timeout: Duration::from_millis(50),
            },
            sample_tx,
            stats.clone(),
            cancel.clone(),
        )
        .unwrap();

        let publish_path = publish.then(|| dir.path().join("publish.sock"));
        let publisher = publish_path
            .as_ref()
            .map(|path| SnapshotPublisher::bind(path.clone(), cancel.clone()).unwrap());

        let emitter = CapturingEmitter {
            snapshots: snapshots.clone(),
        };
        let emitter_handle = EmitterHandle::spawn(emitter, 8);

        let (snapshot_tx, snapshot_rx) = mpsc::channel(8);
        let publish_sender = publisher.as_ref().map(SnapshotPublisher::sender);
        let emitter_dispatcher =
            EmitterDispatcher::new(emitter_handle, publish_sender, snapshot_rx);

        let (flush_tx, flush_rx) = mpsc::channel(4);
        let service = AggregationService::new(
            AggregationEngine::new(Some("testhost".to_string())),
            sample_rx,
            flush_rx,
            snapshot_tx,
            ServiceConfig {
                flush_interval: Duration::from_secs(3600),
                drain_grace: Duration::from_secs(2),
            },
            stats.clone(),
            cancel.clone(),
        );

        let mut handles = vec![receiver.spawn(), service.spawn(), emitter_dispatcher.spawn()];
        if let Some(publisher) = publisher {
            handles.push(publisher.spawn());
        }

        let client = std::os::unix::net::UnixDatagram::unbound().unwrap();
        client.connect(&socket_path).unwrap();

        (
            Pipeline {
                client,
                flush_tx,
                stats,
                cancel,
                snapshots,
                handles,
                _dir: dir,
            },
            publish_path,
        )
    }

    async fn wait_until(what: &str, mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() {
            assert!(Instant::now() < deadline, "timed out waiting for {what}");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    impl Pipeline {
        async fn wait_for_aggregated(&self, count: u64) {
            let stats = self.stats.clone();
            wait_until("samples to aggregate", move || {
                stats.samples_aggregated() >= count
            })
            .await;
        }

        async fn flush(&self) {
            let (request, done) = FlushRequest::new();
            self.flush_tx.send(request).await.unwrap();
            done.await.unwrap();
        }

        async fn wait_for_emitted(&self, count: usize) {
            let snapshots = self.snapshots.clone();
            wait_until("emitter to receive snapshots", move || {
                snapshots.lock().unwrap().len() >= count
            })
            .await;
        }

        async fn shutdown(self) {
            self.cancel.cancel();
            for handle in self.handles {
                handle.await.unwrap();
            }
        }
    }

    /// Scenario: counters sum, gauges last-write-win, timers derive
    /// percentiles, all from real datagrams through one forced flush.
    #[tokio::test]
    async fn test_e2e_socket_to_emitter() {
        let (pipeline, _) = start_pipeline(false);

        for _ in 0..3 {
            pipeline
                .client
                .send(br#"[{"app":"web","metric":"requests","type":"counter","value":1}]"#)
                .unwrap();
        }
        pipeline
            .client
            .send(br#"[{"app":"web","metric":"mem","type":"gauge","value":100},{"app":"web","metric":"mem","type":"gauge","value":150}]"#)
            .unwrap();
        pipeline.wait_for_aggregated(5).await;

        pipeline.flush().await;
        pipeline.wait_for_emitted(1).await;

        let snapshots = pipeline.snapshots.lock().unwrap().clone();
        assert_eq!(snapshots.len(), 1);
        let snapshot = &snapshots[0];
        assert_eq!(snapshot.hostname.as_deref(), Some("testhost"));
        assert_eq!(snapshot.records.len(), 2);

        let counter = snapshot
            .records
            .iter()
            .find(|r| r.kind == MetricKind::Counter)
            .unwrap();
        assert_eq!(counter.fields, EmittedValue::Scalar { value: 3.0 });

        let gauge = snapshot
            .records
            .iter()
            .find(|r| r.kind == MetricKind::Gauge)
            .unwrap();
        assert_eq!(gauge.fields, EmittedValue::Scalar { value: 150.0 });

        // A second flush with no samples emits nothing for the gauge key
        pipeline.flush().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(pipeline.snapshots.lock().unwrap().len(), 1);

        pipeline.shutdown().await;
    }

    #[tokio::test]
    async fn test_e2e_timer_percentiles() {
        let (pipeline, _) = start_pipeline(false);

        // 100 timer samples uniformly distributed 1..=100, sent out of order
        for chunk in [(51..=100), (1..=50)] {
            let records: Vec<String> = chunk
                .map(|v| {
                    format!(r#"{{"app":"web","metric":"latency","type":"timer","value":{v}}}"#)
                })
                .collect();
            let payload = format!("[{}]", records.join(","));
            pipeline.client.send(payload.as_bytes()).unwrap();
        }
        pipeline.wait_for_aggregated(100).await;

        pipeline.flush().await;
        pipeline.wait_for_emitted(1).await;

        let snapshots = pipeline.snapshots.lock().unwrap().clone();
        match &snapshots[0].records[0].fields {
            EmittedValue::Distribution {
                count,
                min,
                max,
                p50,
                p75,
                p95,
                p99,
            } => {
                assert_eq!(*count, 100);
                assert_eq!(*min, 1.0);
                assert_eq!(*max, 100.0);
                assert_eq!(*p50, 50.0);
                assert_eq!(*p75, 75.0);
                assert_eq!(*p95, 95.0);
                assert_eq!(*p99, 99.0);
            }
            other => panic!("expected distribution, got {other:?}"),
        }

        pipeline.shutdown().await;
    }

    /// Scenario: a malformed datagram is dropped and logged, the next valid
    /// one still aggregates.
    #[tokio::test]
    async fn test_e2e_malformed_message_recovery() {
        let (pipeline, _) = start_pipeline(false);

        pipeline.client.send(b"\x00\xffgarbage").unwrap();
        pipeline
            .client
            .send(br#"[{"app":"web","metric":"requests","type":"counter","value":1}]"#)
            .unwrap();

        pipeline.wait_for_aggregated(1).await;
        assert_eq!(pipeline.stats.report().decode_errors, 1);

        pipeline.flush().await;
        pipeline.wait_for_emitted(1).await;

        pipeline.shutdown().await;
    }

    /// Scenario: shutdown with samples queued but unconsumed still folds
    /// them into the final snapshot (drain completes within the grace
    /// period).
    #[tokio::test]
    async fn test_e2e_shutdown_final_flush_includes_queued_samples() {
        let (pipeline, _) = start_pipeline(false);

        for _ in 0..10 {
            pipeline
                .client
                .send(br#"[{"app":"web","metric":"requests","type":"counter","value":1}]"#)
                .unwrap();
        }
        // Wait for receipt (not aggregation) so shutdown races the queue
        let stats = pipeline.stats.clone();
        wait_until("samples to be received", move || {
            stats.report().samples_received >= 10
        })
        .await;

        let snapshots = pipeline.snapshots.clone();
        pipeline.shutdown().await;

        let snapshots = snapshots.lock().unwrap();
        assert_eq!(snapshots.len(), 1, "final flush should emit once");
        assert_eq!(
            snapshots[0].records[0].fields,
            EmittedValue::Scalar { value: 10.0 }
        );
    }

    /// The publish round trip: a subscriber decodes the same record set the
    /// emitter received.
    #[tokio::test]
    async fn test_e2e_publish_round_trip() {
        let (pipeline, publish_path) = start_pipeline(true);
        let publish_path = publish_path.unwrap();

        let stream = tokio::net::UnixStream::connect(&publish_path).await.unwrap();
        // Let the accept loop register the subscription
        tokio::time::sleep(Duration::from_millis(100)).await;

        pipeline
            .client
            .send(br#"[{"app":"web","metric":"requests","type":"counter","value":7}]"#)
            .unwrap();
        pipeline.wait_for_aggregated(1).await;
        pipeline.flush().await;
        pipeline.wait_for_emitted(1).await;

        let mut lines = BufReader::new(stream).lines();
        let line = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
            .await
            .expect("subscriber should receive the snapshot")
            .unwrap()
            .unwrap();

        let published: Vec<contracts::EmittedRecord> = serde_json::from_str(&line).unwrap();
        let emitted = pipeline.snapshots.lock().unwrap()[0].records.clone();
        assert_eq!(published, emitted);

        pipeline.shutdown().await;
    }

    /// Admin channel against a live pipeline: flush over TCP, then status.
    #[tokio::test]
    async fn test_e2e_admin_flush_and_status() {
        let (pipeline, _) = start_pipeline(false);

        let admin = AdminServer::bind(
            "127.0.0.1:0",
            AdminContext {
                stats: pipeline.stats.clone(),
                flush_tx: pipeline.flush_tx.clone(),
                shutdown: pipeline.cancel.clone(),
                started: Instant::now(),
            },
            pipeline.cancel.clone(),
        )
        .await
        .unwrap();
        let addr = admin.local_addr().unwrap();
        let admin_handle = admin.spawn();

        pipeline
            .client
            .send(br#"[{"app":"web","metric":"requests","type":"counter","value":1}]"#)
            .unwrap();
        pipeline.wait_for_aggregated(1).await;

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"{\"command\":\"flush\"}\n").await.unwrap();
        let (reader, mut writer) = stream.split();
        let mut lines = BufReader::new(reader).lines();

        let reply: AdminReply =
            serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(reply, AdminReply::ok());
        pipeline.wait_for_emitted(1).await;

        writer.write_all(b"{\"command\":\"status\"}\n").await.unwrap();
        let reply: AdminReply =
            serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        match reply {
            AdminReply::Ok { stats: Some(body) } => {
                assert_eq!(body.counters.samples_received, 1);
                assert_eq!(body.counters.samples_aggregated, 1);
                assert!(body.counters.flushes >= 1);
            }
            other => panic!("expected ok+stats, got {other:?}"),
        }

        pipeline.shutdown().await;
        admin_handle.await.unwrap();
    }
}
