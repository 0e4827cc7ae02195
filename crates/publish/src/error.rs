//! Publish error types

use std::path::PathBuf;

use thiserror::Error;

/// Publish errors
#[derive(Debug, Error)]
pub enum PublishError {
    /// Socket bind failure, fatal at startup
    #[error("failed to bind publish socket at {path:?}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
