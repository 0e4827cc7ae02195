//! Admin wire protocol
//!
//! Line-delimited JSON request/reply. Requests carry a `command` tag,
//! replies a `status` tag.

use contracts::StatsReport;
use serde::{Deserialize, Serialize};

/// The fixed admin command set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum AdminRequest {
    /// Report daemon counters since start
    Status,
    /// Trigger an out-of-cycle flush
    Flush,
    /// Initiate graceful shutdown
    Shutdown,
}

/// Body of a successful `status` reply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusBody {
    /// Seconds since the daemon started
    pub uptime_secs: u64,

    /// Pipeline counters
    #[serde(flatten)]
    pub counters: StatsReport,
}

/// Reply to one admin request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AdminReply {
    Ok {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stats: Option<StatusBody>,
    },
    Error {
        message: String,
    },
}

impl AdminReply {
    pub fn ok() -> Self {
        AdminReply::Ok { stats: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        AdminReply::Error {
            message: message.into(),
        }
    }
}
