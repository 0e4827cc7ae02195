//! The `send` command: submit one metric to a running daemon

use anyhow::{Context, Result};
use contracts::MetricSample;
use tracing::info;

use crate::cli::{Cli, SendArgs};

/// Encode one sample as a single-element record array and send it to the
/// daemon socket.
pub fn run_send(cli: &Cli, args: &SendArgs) -> Result<()> {
    let sample = MetricSample {
        app: args.app.clone(),
        metric: args.metric.clone(),
        kind: args.metric_type.into(),
        value: args.value,
    };
    sample.validate()?;

    let payload = serde_json::to_vec(&[&sample]).context("failed to encode sample")?;

    let socket = std::os::unix::net::UnixDatagram::unbound()
        .context("failed to create client socket")?;
    socket
        .send_to(&payload, &cli.metrics_socket)
        .with_context(|| {
            format!(
                "failed to send to {} (is the server running?)",
                cli.metrics_socket.display()
            )
        })?;

    info!(
        app = %sample.app,
        metric = %sample.metric,
        kind = %sample.kind,
        value = sample.value,
        "metric sent"
    );
    Ok(())
}
