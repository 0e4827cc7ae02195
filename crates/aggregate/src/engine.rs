//! Aggregation engine - single-owner accumulator store

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use contracts::{EmittedRecord, MetricKey, MetricSample, Snapshot};
use tracing::trace;

use crate::accumulator::Accumulator;

/// In-memory store keyed by `(app, metric, type)` for one epoch.
///
/// Exclusively owned by the aggregation service task for the duration of an
/// epoch; no concurrent writers exist by design, so no locking is needed.
#[derive(Debug)]
pub struct AggregationEngine {
    accumulators: HashMap<MetricKey, Accumulator>,
    hostname: Option<String>,
}

impl AggregationEngine {
    /// Create an empty engine. The hostname tag is stamped on every
    /// snapshot this engine produces.
    pub fn new(hostname: Option<String>) -> Self {
        Self {
            accumulators: HashMap::new(),
            hostname,
        }
    }

    /// Fold one sample into its accumulator per the type rules.
    pub fn fold(&mut self, sample: MetricSample) {
        trace!(app = %sample.app, metric = %sample.metric, kind = %sample.kind, "folding sample");
        match self.accumulators.entry(sample.key()) {
            Entry::Occupied(mut entry) => entry.get_mut().fold(sample.value),
            Entry::Vacant(entry) => {
                entry.insert(Accumulator::new(sample.kind, sample.value));
            }
        }
    }

    /// Number of keys active in the current epoch.
    pub fn key_count(&self) -> usize {
        self.accumulators.len()
    }

    /// Atomically take the current accumulator map and install a fresh one.
    ///
    /// The returned snapshot reflects exactly the samples folded before this
    /// call and none folded after. Keys with no samples this epoch produce
    /// no record. Records are sorted for deterministic output.
    pub fn take_snapshot(&mut self) -> Snapshot {
        let epoch = std::mem::take(&mut self.accumulators);
        let mut records: Vec<EmittedRecord> = epoch
            .into_iter()
            .map(|(key, accumulator)| EmittedRecord {
                app: key.app,
                metric: key.metric,
                kind: key.kind,
                fields: accumulator.into_value(),
            })
            .collect();
        records.sort_by(|a, b| {
            (a.app.as_str(), a.metric.as_str(), a.kind.as_str())
                .cmp(&(b.app.as_str(), b.metric.as_str(), b.kind.as_str()))
        });
        Snapshot::new(self.hostname.clone(), records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{EmittedValue, MetricKind};

    fn sample(app: &str, metric: &str, kind: MetricKind, value: f64) -> MetricSample {
        MetricSample {
            app: app.to_string(),
            metric: metric.to_string(),
            kind,
            value,
        }
    }

    #[test]
    fn test_counter_additivity() {
        let mut engine = AggregationEngine::new(None);
        for _ in 0..3 {
            engine.fold(sample("web", "requests", MetricKind::Counter, 1.0));
        }

        let snapshot = engine.take_snapshot();
        assert_eq!(snapshot.records.len(), 1);
        let record = &snapshot.records[0];
        assert_eq!(record.app, "web");
        assert_eq!(record.metric, "requests");
        assert_eq!(record.kind, MetricKind::Counter);
        assert_eq!(record.fields, EmittedValue::Scalar { value: 3.0 });
    }

    #[test]
    fn test_gauge_absent_next_epoch() {
        let mut engine = AggregationEngine::new(None);
        engine.fold(sample("web", "mem", MetricKind::Gauge, 100.0));
        engine.fold(sample("web", "mem", MetricKind::Gauge, 150.0));

        let first = engine.take_snapshot();
        assert_eq!(first.records.len(), 1);
        assert_eq!(first.records[0].fields, EmittedValue::Scalar { value: 150.0 });

        // No samples in the next epoch: the key produces no record
        let second = engine.take_snapshot();
        assert!(second.is_empty());
    }

    #[test]
    fn test_same_name_different_kinds_are_distinct_keys() {
        let mut engine = AggregationEngine::new(None);
        engine.fold(sample("web", "load", MetricKind::Counter, 1.0));
        engine.fold(sample("web", "load", MetricKind::Gauge, 9.0));

        let snapshot = engine.take_snapshot();
        assert_eq!(snapshot.records.len(), 2);
    }

    #[test]
    fn test_take_snapshot_epoch_boundary() {
        let mut engine = AggregationEngine::new(None);
        engine.fold(sample("web", "requests", MetricKind::Counter, 1.0));

        let first = engine.take_snapshot();
        assert_eq!(first.records[0].fields, EmittedValue::Scalar { value: 1.0 });

        // Folded after the swap: lands in the next snapshot only
        engine.fold(sample("web", "requests", MetricKind::Counter, 5.0));
        let second = engine.take_snapshot();
        assert_eq!(second.records[0].fields, EmittedValue::Scalar { value: 5.0 });
    }

    #[test]
    fn test_snapshot_carries_hostname() {
        let mut engine = AggregationEngine::new(Some("host01".to_string()));
        engine.fold(sample("web", "requests", MetricKind::Counter, 1.0));
        let snapshot = engine.take_snapshot();
        assert_eq!(snapshot.hostname.as_deref(), Some("host01"));
    }

    #[test]
    fn test_records_sorted_by_app_then_metric() {
        let mut engine = AggregationEngine::new(None);
        engine.fold(sample("zeta", "a", MetricKind::Counter, 1.0));
        engine.fold(sample("alpha", "b", MetricKind::Counter, 1.0));
        engine.fold(sample("alpha", "a", MetricKind::Counter, 1.0));

        let snapshot = engine.take_snapshot();
        let names: Vec<_> = snapshot
            .records
            .iter()
            .map(|r| format!("{}.{}", r.app, r.metric))
            .collect();
        assert_eq!(names, vec!["alpha.a", "alpha.b", "zeta.a"]);
    }
}
