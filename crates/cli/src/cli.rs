//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// tallyd - host-local metrics aggregator and emitter
#[derive(Parser, Debug)]
#[command(
    name = "tallyd",
    author,
    version,
    about = "Host-local metrics aggregation daemon",
    long_about = "A host-local metrics aggregation daemon.\n\n\
                  Client processes submit named, typed metric samples over a \n\
                  local socket; the daemon buffers, aggregates, and periodically \n\
                  emits them to a configurable downstream sink, broadcasting \n\
                  emitted results to any real-time subscriber."
)]
pub struct Cli {
    /// Metrics socket path where the server listens
    #[arg(
        short = 's',
        long,
        default_value = "/var/tmp/metrics_socket",
        global = true,
        env = "TALLYD_METRICS_SOCKET"
    )]
    pub metrics_socket: PathBuf,

    /// Set log level
    #[arg(
        short = 'l',
        long,
        default_value = "info",
        global = true,
        env = "TALLYD_LOG_LEVEL"
    )]
    pub log_level: String,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "TALLYD_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Set up a server to receive metrics and emit them
    Server(ServerArgs),

    /// Send one metric to a tallyd server
    Send(SendArgs),
}

/// Arguments for the `server` command
#[derive(Parser, Debug, Clone)]
pub struct ServerArgs {
    /// Source hostname to use while emitting metrics
    #[arg(short = 'H', long, env = "TALLYD_HOSTNAME")]
    pub hostname: Option<String>,

    /// Permissions in octal for the metrics socket
    #[arg(short = 'm', long)]
    pub socket_mode: Option<String>,

    /// Address for admin commands
    #[arg(short = 'C', long, default_value = contracts::DEFAULT_ADMIN_ADDR)]
    pub command_port: String,

    /// Publish socket path for snapshot notifications (unset = disabled)
    #[arg(short = 'P', long)]
    pub publish_port: Option<PathBuf>,

    /// Emitter to use
    #[arg(short = 'e', long, default_value = "simple")]
    pub emitter: String,

    /// Arguments to the emitter in the form key=val. Can be repeated
    #[arg(short = 'E', long = "emitter-args")]
    pub emitter_args: Vec<String>,

    /// Interval in seconds to emit metrics
    #[arg(short = 'i', long, default_value = "60")]
    pub emit_interval: u64,

    /// Capacity of the internal sample queue
    #[arg(long, default_value = "1000")]
    pub queue_capacity: usize,

    /// Socket-level high-water-mark, in messages
    #[arg(long, default_value = "20000")]
    pub socket_hwm: usize,

    /// Grace period in seconds for draining queued samples at shutdown
    #[arg(long, default_value = "5")]
    pub drain_grace: u64,
}

/// Arguments for the `send` command
#[derive(Parser, Debug, Clone)]
pub struct SendArgs {
    /// Submitting application identifier
    #[arg(short, long)]
    pub app: String,

    /// Metric name
    #[arg(short, long)]
    pub metric: String,

    /// Metric type
    #[arg(short = 't', long = "type", value_enum)]
    pub metric_type: MetricTypeArg,

    /// Observed value
    #[arg(short, long)]
    pub value: f64,
}

/// Metric type argument
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum MetricTypeArg {
    Counter,
    Gauge,
    Timer,
}

impl From<MetricTypeArg> for contracts::MetricKind {
    fn from(value: MetricTypeArg) -> Self {
        match value {
            MetricTypeArg::Counter => contracts::MetricKind::Counter,
            MetricTypeArg::Gauge => contracts::MetricKind::Gauge,
            MetricTypeArg::Timer => contracts::MetricKind::Timer,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(value: LogFormat) -> Self {
        match value {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
