//! Per-key accumulators and their type-specific fold rules

use contracts::{EmittedValue, MetricKind};

/// The fixed percentile set derived from timer distributions at flush time
const PERCENTILES: [f64; 4] = [0.50, 0.75, 0.95, 0.99];

/// State accumulated for one key within one aggregation epoch.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    /// Running sum of counter values
    Counter(f64),
    /// Last-observed gauge value, arrival order
    Gauge(f64),
    /// Timer observations, ordered on demand at flush
    Timer(Vec<f64>),
}

impl Accumulator {
    /// Start an accumulator from the first sample of the epoch.
    pub fn new(kind: MetricKind, value: f64) -> Self {
        match kind {
            MetricKind::Counter => Accumulator::Counter(value),
            MetricKind::Gauge => Accumulator::Gauge(value),
            MetricKind::Timer => Accumulator::Timer(vec![value]),
        }
    }

    /// Fold one more observation into the accumulator.
    pub fn fold(&mut self, value: f64) {
        match self {
            Accumulator::Counter(sum) => *sum += value,
            Accumulator::Gauge(last) => *last = value,
            Accumulator::Timer(values) => values.push(value),
        }
    }

    /// Reduce the accumulator to its emitted fields.
    ///
    /// Timers sort their observations once and derive count/min/max plus the
    /// nearest-rank percentile set; the computation is independent of
    /// arrival order.
    pub fn into_value(self) -> EmittedValue {
        match self {
            Accumulator::Counter(sum) => EmittedValue::Scalar { value: sum },
            Accumulator::Gauge(last) => EmittedValue::Scalar { value: last },
            Accumulator::Timer(mut values) => {
                values.sort_by(f64::total_cmp);
                EmittedValue::Distribution {
                    count: values.len() as u64,
                    min: values[0],
                    max: values[values.len() - 1],
                    p50: percentile(&values, PERCENTILES[0]),
                    p75: percentile(&values, PERCENTILES[1]),
                    p95: percentile(&values, PERCENTILES[2]),
                    p99: percentile(&values, PERCENTILES[3]),
                }
            }
        }
    }
}

/// Nearest-rank percentile over a non-empty sorted slice.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = (q * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}
