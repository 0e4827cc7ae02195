//! FileEmitter - appends snapshots to a local file as JSON lines

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use contracts::{ContractError, Emitter, Snapshot};
use tracing::debug;

/// Default output path when no `path` argument is supplied
const DEFAULT_PATH: &str = "./metrics.out";

/// Emitter that appends one JSON line per snapshot to a file.
///
/// Accepts a single `path=...` argument.
pub struct FileEmitter {
    name: String,
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileEmitter {
    /// Create a new FileEmitter writing to `path`
    pub fn new(name: impl Into<String>, path: PathBuf) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            name: name.into(),
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Create from params map (for the registry)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let path = params
            .get("path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PATH));
        Self::new(name, path)
    }

    fn append_snapshot(&mut self, snapshot: &Snapshot) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, snapshot)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

impl Emitter for FileEmitter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn emit(&mut self, snapshot: &Snapshot) -> Result<(), ContractError> {
        self.append_snapshot(snapshot)
            .map_err(|e| ContractError::emitter_write(&self.name, e.to_string()))
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.writer
            .flush()
            .map_err(|e| ContractError::emitter_write(&self.name, e.to_string()))?;
        debug!(emitter = %self.name, path = %self.path.display(), "FileEmitter closed");
        Ok(())
    }
}
