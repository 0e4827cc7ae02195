//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Emitter creation error (unknown name, bad args)
    #[error("failed to create emitter '{name}': {message}")]
    EmitterCreation { name: String, message: String },

    /// Emitter error (from contract)
    #[error("emitter error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create an emitter creation error
    pub fn emitter_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmitterCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
