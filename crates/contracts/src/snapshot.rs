//! Snapshot - aggregation epoch output
//!
//! The immutable record set handed to the emitter and the publish broadcaster.

use serde::{Deserialize, Serialize};

use crate::MetricKind;

/// Derived fields of one emitted record.
///
/// Counters and gauges reduce to a scalar; timers reduce to a fixed
/// percentile set plus count/min/max.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmittedValue {
    Distribution {
        count: u64,
        min: f64,
        max: f64,
        p50: f64,
        p75: f64,
        p95: f64,
        p99: f64,
    },
    Scalar {
        value: f64,
    },
}

/// One emitted record, one per key active in the epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmittedRecord {
    pub app: String,
    pub metric: String,
    #[serde(rename = "type")]
    pub kind: MetricKind,
    #[serde(flatten)]
    pub fields: EmittedValue,
}

/// An immutable aggregation epoch result.
///
/// Shared read-only between the emitter dispatcher and the publish
/// broadcaster, discarded after both complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Source hostname tag, when configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// UTC epoch seconds at flush time
    pub timestamp: i64,

    /// Emitted records for all keys active this epoch
    pub records: Vec<EmittedRecord>,
}

impl Snapshot {
    /// Build a snapshot stamped with the current UTC time.
    pub fn new(hostname: Option<String>, records: Vec<EmittedRecord>) -> Self {
        Self {
            hostname,
            timestamp: chrono::Utc::now().timestamp(),
            records,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
