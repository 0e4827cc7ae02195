//! Daemon orchestrator - binds endpoints, spawns tasks, coordinates
//! graceful shutdown.
//!
//! Shutdown is strict order: stop accepting new samples, drain the queue
//! into the engine, one final flush, close all endpoints, exit.

use std::sync::Arc;
use std::time::Instant;

use admin::{AdminContext, AdminServer};
use aggregate::{AggregationEngine, AggregationService, ServiceConfig};
use anyhow::{Context, Result};
use contracts::{DaemonStats, ServerConfig};
use dispatcher::{create_emitter_handle, EmitterDispatcher};
use ingestion::{ReceiverConfig, SampleReceiver};
use publish::SnapshotPublisher;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Per-emitter queue depth between dispatcher and worker
const EMITTER_QUEUE_CAPACITY: usize = 8;

/// Snapshot channel depth between aggregation service and dispatcher
const SNAPSHOT_CHANNEL_CAPACITY: usize = 8;

/// Flush request channel depth between admin channel and service
const FLUSH_CHANNEL_CAPACITY: usize = 4;

/// Run the daemon to completion.
///
/// Binds every endpoint before spawning anything: transport bind failures
/// are fatal and surface as a non-zero exit.
pub async fn run_daemon(config: ServerConfig) -> Result<()> {
    let cancel = CancellationToken::new();
    let stats = Arc::new(DaemonStats::new());
    let started = Instant::now();

    // --- Bind endpoints ---
    let (sample_tx, sample_rx) = async_channel::bounded(config.queue_capacity);

    let receiver = SampleReceiver::bind(
        ReceiverConfig {
            socket_path: config.socket_path.clone(),
            socket_mode: config.socket_mode,
            socket_hwm: config.socket_hwm,
            poll_timeout: config.poll_timeout,
        },
        sample_tx,
        stats.clone(),
        cancel.clone(),
    )
    .context("failed to bind ingestion socket")?;

    let publisher = match &config.publish_path {
        Some(path) => Some(
            SnapshotPublisher::bind(path.clone(), cancel.clone())
                .context("failed to bind publish socket")?,
        ),
        None => {
            info!("publish endpoint not configured, broadcaster disabled");
            None
        }
    };

    let (flush_tx, flush_rx) = mpsc::channel(FLUSH_CHANNEL_CAPACITY);

    let admin = AdminServer::bind(
        &config.admin_addr,
        AdminContext {
            stats: stats.clone(),
            flush_tx,
            shutdown: cancel.clone(),
            started,
        },
        cancel.clone(),
    )
    .await
    .context("failed to bind admin listener")?;

    // --- Build the pipeline ---
    let emitter_handle = create_emitter_handle(&config.emitter, EMITTER_QUEUE_CAPACITY)
        .context("failed to create emitter")?;
    info!(emitter = %config.emitter.name, "emitter configured");

    let (snapshot_tx, snapshot_rx) = mpsc::channel(SNAPSHOT_CHANNEL_CAPACITY);
    let publish_sender = publisher.as_ref().map(SnapshotPublisher::sender);
    let emitter_dispatcher = EmitterDispatcher::new(emitter_handle, publish_sender, snapshot_rx);

    let service = AggregationService::new(
        AggregationEngine::new(config.hostname.clone()),
        sample_rx,
        flush_rx,
        snapshot_tx,
        ServiceConfig {
            flush_interval: config.flush_interval,
            drain_grace: config.drain_grace,
        },
        stats.clone(),
        cancel.clone(),
    );

    // --- Spawn tasks ---
    let receiver_handle = receiver.spawn();
    let service_handle = service.spawn();
    let dispatcher_handle = emitter_dispatcher.spawn();
    let publisher_handle = publisher.map(SnapshotPublisher::spawn);
    let admin_handle = admin.spawn();

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        wait_for_termination_signal().await;
        signal_cancel.cancel();
    });

    info!("daemon started");

    // --- Shutdown sequence ---
    // The receiver exits first on cancellation and drops its queue sender;
    // the service drains within the grace period, performs the final flush
    // and closes the snapshot channel; the dispatcher then shuts the
    // emitter down. Publisher and admin observe the same token.
    receiver_handle.await.context("receiver task failed")?;
    service_handle.await.context("aggregation task failed")?;
    dispatcher_handle.await.context("dispatcher task failed")?;
    if let Some(handle) = publisher_handle {
        handle.await.context("publisher task failed")?;
    }
    admin_handle.await.context("admin task failed")?;

    let report = stats.report();
    info!(
        samples_received = report.samples_received,
        samples_aggregated = report.samples_aggregated,
        flushes = report.flushes,
        "daemon stopped"
    );

    Ok(())
}

/// Resolve when SIGTERM, SIGINT or SIGPIPE is delivered.
async fn wait_for_termination_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let streams = (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
        signal(SignalKind::pipe()),
    );
    let (mut sigterm, mut sigint, mut sigpipe) = match streams {
        (Ok(t), Ok(i), Ok(p)) => (t, i, p),
        _ => {
            error!("failed to install signal handlers, shutdown via admin channel only");
            std::future::pending::<()>().await;
            unreachable!()
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("got SIGTERM, shutting down"),
        _ = sigint.recv() => info!("got SIGINT, shutting down"),
        _ = sigpipe.recv() => info!("got SIGPIPE, shutting down"),
    }
}
