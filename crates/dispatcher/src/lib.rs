//! # Dispatcher
//!
//! Emitter dispatch stage.
//!
//! Responsibilities:
//! - Resolve the configured emitter by name (startup-time registry)
//! - Run the emitter behind an isolated queue + worker task
//! - Forward every snapshot to the publish broadcaster regardless of
//!   emitter outcome
//!
//! Emission failures are logged and counted, never fatal, never retried by
//! the dispatcher itself.

mod dispatcher;
mod emitters;
mod error;
mod handle;
mod metrics;

pub use dispatcher::{EmitterDispatcher, SnapshotSender};
pub use emitters::{create_emitter_handle, FileEmitter, SimpleEmitter};
pub use error::DispatcherError;
pub use handle::EmitterHandle;
pub use metrics::{EmitterMetrics, EmitterMetricsSnapshot};
