//! The `server` command: build the daemon configuration and run it

use std::time::Duration;

use anyhow::{bail, Result};
use contracts::{
    parse_socket_mode, EmitterConfig, ServerConfig, DEFAULT_POLL_TIMEOUT,
};

use crate::cli::{Cli, ServerArgs};
use crate::daemon;

/// Build a [`ServerConfig`] from the CLI surface and run the daemon to
/// completion.
pub async fn run_server(cli: &Cli, args: &ServerArgs) -> Result<()> {
    let config = build_config(cli, args)?;
    daemon::run_daemon(config).await
}

fn build_config(cli: &Cli, args: &ServerArgs) -> Result<ServerConfig> {
    if args.emit_interval == 0 {
        bail!("emit-interval must be at least 1 second");
    }
    if args.queue_capacity == 0 {
        bail!("queue-capacity must be at least 1");
    }

    let socket_mode = args
        .socket_mode
        .as_deref()
        .map(parse_socket_mode)
        .transpose()?;

    Ok(ServerConfig {
        socket_path: cli.metrics_socket.clone(),
        socket_mode,
        socket_hwm: args.socket_hwm,
        poll_timeout: DEFAULT_POLL_TIMEOUT,
        queue_capacity: args.queue_capacity,
        hostname: args.hostname.clone(),
        admin_addr: args.command_port.clone(),
        publish_path: args.publish_port.clone(),
        emitter: EmitterConfig::new(&args.emitter, args.emitter_args.clone()),
        flush_interval: Duration::from_secs(args.emit_interval),
        drain_grace: Duration::from_secs(args.drain_grace),
    })
}
