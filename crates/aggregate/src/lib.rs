//! # Aggregate
//!
//! In-memory aggregation engine and flush scheduling.
//!
//! Responsibilities:
//! - Fold samples into per-key accumulators (counter / gauge / timer rules)
//! - Atomically swap out the epoch's accumulator map at flush
//! - Drive the flush cadence: interval ticks, admin force-flush, one final
//!   flush during graceful shutdown
//!
//! The engine is owned by a single consumer task; there is no locking, the
//! take-and-replace boundary is exact by construction.

mod accumulator;
mod engine;
mod service;

pub use accumulator::Accumulator;
pub use contracts::FlushRequest;
pub use engine::AggregationEngine;
pub use service::{AggregationService, ServiceConfig};
