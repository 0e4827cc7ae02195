//! Layered error definitions
//!
//! Categorized by source: config / transport / decode / emitter / admin

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Transport Errors =====
    /// Socket bind error (fatal at startup)
    #[error("bind error at '{endpoint}': {message}")]
    Bind { endpoint: String, message: String },

    /// Socket receive error
    #[error("socket receive error: {message}")]
    SocketRecv { message: String },

    // ===== Decode Errors =====
    /// Inbound message decode error
    #[error("decode error: {message}")]
    Decode { message: String },

    /// Sample rejected by validation
    #[error("invalid sample at '{field}': {message}")]
    InvalidSample { field: String, message: String },

    // ===== Emitter Errors =====
    /// Emitter write error
    #[error("emitter '{emitter_name}' write error: {message}")]
    EmitterWrite {
        emitter_name: String,
        message: String,
    },

    /// Emitter creation error (unknown name, bad args)
    #[error("emitter '{emitter_name}' creation error: {message}")]
    EmitterCreation {
        emitter_name: String,
        message: String,
    },

    // ===== Admin Errors =====
    /// Malformed or unknown admin command
    #[error("admin protocol error: {message}")]
    AdminProtocol { message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create bind error
    pub fn bind(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Bind {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create sample validation error
    pub fn invalid_sample(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSample {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create emitter write error
    pub fn emitter_write(emitter_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmitterWrite {
            emitter_name: emitter_name.into(),
            message: message.into(),
        }
    }

    /// Create emitter creation error
    pub fn emitter_creation(emitter_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmitterCreation {
            emitter_name: emitter_name.into(),
            message: message.into(),
        }
    }
}
