//! Admin error types

use thiserror::Error;

/// Admin errors
#[derive(Debug, Error)]
pub enum AdminError {
    /// Listener bind failure, fatal at startup
    #[error("failed to bind admin listener at {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
