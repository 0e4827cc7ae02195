//! MetricSample - the unit of client input

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Metric type, determining the aggregation rule for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Running sum over the epoch
    Counter,
    /// Last observed value in the epoch wins
    Gauge,
    /// Percentile distribution over the epoch's observations
    Timer,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Timer => "timer",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One metric observation submitted by a client process.
///
/// Samples are transient: decoded from one inbound message, folded into an
/// accumulator exactly once, then discarded. A record with an unrecognized
/// `type` fails serde deserialization and never enters the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Submitting application identifier
    pub app: String,

    /// Metric name
    pub metric: String,

    /// Metric type
    #[serde(rename = "type")]
    pub kind: MetricKind,

    /// Observed value
    pub value: f64,
}

impl MetricSample {
    /// Check the sample invariants: non-empty identifiers, finite value.
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.app.is_empty() {
            return Err(ContractError::invalid_sample("app", "must not be empty"));
        }
        if self.metric.is_empty() {
            return Err(ContractError::invalid_sample("metric", "must not be empty"));
        }
        if !self.value.is_finite() {
            return Err(ContractError::invalid_sample("value", "must be finite"));
        }
        Ok(())
    }

    /// The aggregation key this sample folds into.
    pub fn key(&self) -> MetricKey {
        MetricKey {
            app: self.app.clone(),
            metric: self.metric.clone(),
            kind: self.kind,
        }
    }
}

/// Aggregation key: unique within one epoch, insertion-order-irrelevant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricKey {
    pub app: String,
    pub metric: String,
    pub kind: MetricKind,
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} ({})", self.app, self.metric, self.kind)
    }
}
