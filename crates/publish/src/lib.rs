//! # Publish
//!
//! Snapshot broadcaster.
//!
//! Responsibilities:
//! - Bind the optional publish socket
//! - Re-publish every dispatched snapshot to all connected subscribers
//!
//! Delivery is best-effort: a subscriber that is not keeping up misses
//! snapshots (the skipped count is logged) and a dead subscriber is simply
//! disconnected. The broadcaster never blocks the dispatcher. When no
//! publish path is configured the component is not constructed at all.

mod error;
mod publisher;

pub use error::PublishError;
pub use publisher::{SnapshotPublisher, SNAPSHOT_FANOUT_CAPACITY};
