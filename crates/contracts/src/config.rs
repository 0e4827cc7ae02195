//! Daemon configuration structs
//!
//! Built by the CLI from flags and passed explicitly into each component.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Channel buffer for queueing decoded samples between receiver and engine
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Socket-level high-water-mark, in messages
pub const DEFAULT_SOCKET_HWM: usize = 20_000;

/// Bounded socket poll timeout so cancellation is observed promptly
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(1);

/// Interval between flushes
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(60);

/// Shutdown drain grace period
pub const DEFAULT_DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Default admin request/reply address
pub const DEFAULT_ADMIN_ADDR: &str = "127.0.0.1:26300";

/// Emitter selection: a name plus `key=value` argument strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitterConfig {
    /// Registered emitter name
    pub name: String,

    /// Ordered `key=value` argument strings, as given on the command line
    pub args: Vec<String>,
}

impl EmitterConfig {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Parse the argument list into a map. Duplicate keys: last value wins.
    /// An argument without `=` is a configuration error.
    pub fn parse_args(&self) -> Result<HashMap<String, String>, ContractError> {
        let mut params = HashMap::new();
        for arg in &self.args {
            let (key, value) = arg.split_once('=').ok_or_else(|| {
                ContractError::config_validation(
                    "emitter-args",
                    format!("expected key=value, got '{arg}'"),
                )
            })?;
            params.insert(key.to_string(), value.to_string());
        }
        Ok(params)
    }
}

/// Full daemon configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Ingestion socket path
    pub socket_path: PathBuf,

    /// Octal permissions applied to the ingestion socket file
    pub socket_mode: Option<u32>,

    /// Socket-level high-water-mark, in messages
    pub socket_hwm: usize,

    /// Bounded receive poll timeout
    pub poll_timeout: Duration,

    /// Capacity of the internal sample queue
    pub queue_capacity: usize,

    /// Hostname tag stamped on emitted snapshots
    pub hostname: Option<String>,

    /// Admin request/reply TCP address
    pub admin_addr: String,

    /// Publish socket path (None = broadcaster disabled)
    pub publish_path: Option<PathBuf>,

    /// Emitter selection
    pub emitter: EmitterConfig,

    /// Interval between flushes
    pub flush_interval: Duration,

    /// Grace period for draining queued samples at shutdown
    pub drain_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/var/tmp/metrics_socket"),
            socket_mode: None,
            socket_hwm: DEFAULT_SOCKET_HWM,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            hostname: None,
            admin_addr: DEFAULT_ADMIN_ADDR.to_string(),
            publish_path: None,
            emitter: EmitterConfig::new("simple", Vec::new()),
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            drain_grace: DEFAULT_DRAIN_GRACE,
        }
    }
}

/// Parse an octal mode string like "0660" into permission bits.
pub fn parse_socket_mode(mode: &str) -> Result<u32, ContractError> {
    u32::from_str_radix(mode, 8).map_err(|_| {
        ContractError::config_validation("socket-mode", format!("'{mode}' is not octal"))
    })
}
