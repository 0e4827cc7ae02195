//! Inbound message decoding
//!
//! Clients send one JSON array of metric records per datagram. Records are
//! validated individually so one bad record does not discard its neighbors.

use contracts::{ContractError, MetricSample};
use tracing::warn;

/// Result of decoding one inbound message.
#[derive(Debug, Default)]
pub struct DecodeOutcome {
    /// Samples that passed validation, in message order
    pub samples: Vec<MetricSample>,

    /// Records rejected (unknown type, empty identifier, non-finite value)
    pub rejected: usize,
}

/// Decode one datagram as a JSON array of metric records.
///
/// A message that is not a JSON array fails as a whole; within a parseable
/// array, each record is decoded and validated on its own and rejects are
/// counted rather than aborting the message.
pub fn decode_message(data: &[u8]) -> Result<DecodeOutcome, ContractError> {
    let raw: Vec<serde_json::Value> = serde_json::from_slice(data)
        .map_err(|e| ContractError::decode(format!("not a JSON array of records: {e}")))?;

    let mut outcome = DecodeOutcome {
        samples: Vec::with_capacity(raw.len()),
        rejected: 0,
    };

    for value in raw {
        let sample: MetricSample = match serde_json::from_value(value) {
            Ok(sample) => sample,
            Err(e) => {
                warn!(error = %e, "rejecting metric record");
                outcome.rejected += 1;
                continue;
            }
        };
        if let Err(e) = sample.validate() {
            warn!(error = %e, app = %sample.app, metric = %sample.metric, "rejecting metric record");
            outcome.rejected += 1;
            continue;
        }
        outcome.samples.push(sample);
    }

    Ok(outcome)
}
