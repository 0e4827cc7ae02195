//! Emitter trait - downstream sink interface
//!
//! Defines the abstract interface for emitters.

use crate::{ContractError, Snapshot};

/// Downstream emission trait
///
/// All emitter implementations must implement this trait. Emission failures
/// are non-fatal to the pipeline and are not retried by the dispatcher; an
/// implementation may add its own retry behavior. The dispatcher serializes
/// calls through a single worker, so implementations are not required to
/// tolerate concurrent `emit` invocations.
#[trait_variant::make(Emitter: Send)]
pub trait LocalEmitter {
    /// Emitter name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Emit one aggregated snapshot downstream
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn emit(&mut self, snapshot: &Snapshot) -> Result<(), ContractError>;

    /// Close emitter, flushing any internal buffer
    async fn close(&mut self) -> Result<(), ContractError>;
}
