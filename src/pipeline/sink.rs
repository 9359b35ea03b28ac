//! Dataset sinks: append-only destinations for accepted records.

use crate::models::{CogsynthError, DatasetRecord, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Append-only destination for accepted records.
pub trait DatasetSink {
    fn append(&mut self, record: &DatasetRecord) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes one JSON object per line, appending to any existing file.
pub struct JsonlSink {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl JsonlSink {
    /// Open `path` for appending, creating it and its parent directory if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| CogsynthError::io("creating output directory", e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| CogsynthError::io("opening output file", e))?;

        debug!(path = %path.display(), "Opened dataset sink");
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written through this handle.
    pub fn written(&self) -> usize {
        self.written
    }
}

impl DatasetSink for JsonlSink {
    fn append(&mut self, record: &DatasetRecord) -> Result<()> {
        let json = serde_json::to_string(record)
            .map_err(|e| CogsynthError::Internal(format!("Failed to serialize record: {e}")))?;
        writeln!(self.writer, "{json}").map_err(|e| CogsynthError::io("writing output", e))?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| CogsynthError::io("flushing output", e))
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<DatasetRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DatasetSink for MemorySink {
    fn append(&mut self, record: &DatasetRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}
