//! SimpleEmitter - writes emitted records to the log sink via tracing

use contracts::{ContractError, Emitter, Snapshot};
use tracing::info;

/// The default emitter: one log line per emitted record.
pub struct SimpleEmitter {
    name: String,
}

impl SimpleEmitter {
    /// Create a new SimpleEmitter with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Emitter for SimpleEmitter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn emit(&mut self, snapshot: &Snapshot) -> Result<(), ContractError> {
        for record in &snapshot.records {
            let fields = serde_json::to_string(&record.fields)
                .map_err(|e| ContractError::emitter_write(&self.name, e.to_string()))?;
            info!(
                emitter = %self.name,
                timestamp = snapshot.timestamp,
                hostname = snapshot.hostname.as_deref().unwrap_or(""),
                app = %record.app,
                metric = %record.metric,
                kind = %record.kind,
                %fields,
                "metric emitted"
            );
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        info!(emitter = %self.name, "SimpleEmitter closed");
        Ok(())
    }
}
