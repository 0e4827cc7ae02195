//! Ingestion error types

use std::path::PathBuf;

use thiserror::Error;

/// Ingestion errors
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Socket bind failure, fatal at startup
    #[error("failed to bind ingestion socket at {path:?}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Socket option could not be applied
    #[error("failed to configure ingestion socket: {0}")]
    SocketOption(#[source] std::io::Error),

    /// Socket file permissions could not be applied
    #[error("failed to set mode {mode:o} on {path:?}: {source}")]
    SocketMode {
        path: PathBuf,
        mode: u32,
        #[source]
        source: std::io::Error,
    },
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
