//! Emitter registry
//!
//! Maps configured emitter names to constructors. Resolution happens once at
//! startup: an unknown name is a configuration error, not a runtime one.

mod file;
mod simple;

pub use file::FileEmitter;
pub use simple::SimpleEmitter;

use contracts::EmitterConfig;

use crate::error::DispatcherError;
use crate::handle::EmitterHandle;

/// Create the configured emitter and spawn it behind an [`EmitterHandle`].
pub fn create_emitter_handle(
    config: &EmitterConfig,
    queue_capacity: usize,
) -> Result<EmitterHandle, DispatcherError> {
    let params = config
        .parse_args()
        .map_err(|e| DispatcherError::emitter_creation(&config.name, e.to_string()))?;

    match config.name.as_str() {
        "simple" => Ok(EmitterHandle::spawn(
            SimpleEmitter::new(&config.name),
            queue_capacity,
        )),
        "file" => {
            let emitter = FileEmitter::from_params(&config.name, &params)
                .map_err(|e| DispatcherError::emitter_creation(&config.name, e.to_string()))?;
            Ok(EmitterHandle::spawn(emitter, queue_capacity))
        }
        other => Err(DispatcherError::emitter_creation(
            other,
            "unknown emitter name",
        )),
    }
}
