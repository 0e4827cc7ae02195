//! # Ingestion
//!
//! Sample ingestion module.
//!
//! Responsibilities:
//! - Bind the datagram socket clients submit metrics to
//! - Decode inbound messages as JSON arrays of metric records
//! - Validate each record against the sample invariants
//! - Send valid samples downstream via async-channel (bounded, blocking push)
//!
//! Backpressure is two-layered: the kernel receive buffer is sized from the
//! configured high-water-mark and drops datagrams under client misbehavior,
//! while the bounded channel stalls the receive loop when the aggregation
//! engine falls behind.
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{ReceiverConfig, SampleReceiver};
//!
//! let (tx, rx) = async_channel::bounded(config.queue_capacity);
//! let receiver = SampleReceiver::bind(receiver_config, tx, stats, cancel)?;
//! let handle = receiver.spawn();
//! while let Ok(sample) = rx.recv().await {
//!     // Fold sample
//! }
//! ```

mod decode;
mod error;
mod receiver;

// Re-exports
pub use contracts::MetricSample;
pub use decode::{decode_message, DecodeOutcome};
pub use error::{IngestionError, Result};
pub use receiver::{ReceiverConfig, SampleReceiver};
