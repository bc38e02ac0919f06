//! Append-only record sinks.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::models::JobRecord;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Append-only dataset sink. Emission is not idempotent; callers dedupe
/// before emitting.
pub trait RecordSink: Send {
    fn emit(&mut self, record: &JobRecord) -> Result<(), SinkError>;
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn emit(&mut self, record: &JobRecord) -> Result<(), SinkError> {
        (**self).emit(record)
    }
}

/// One JSON object per line, appended to a file.
pub struct JsonlSink {
    writer: BufWriter<File>,
}

impl JsonlSink {
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl RecordSink for JsonlSink {
    fn emit(&mut self, record: &JobRecord) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// JSON lines on stdout.
#[derive(Default)]
pub struct StdoutSink;

impl RecordSink for StdoutSink {
    fn emit(&mut self, record: &JobRecord) -> Result<(), SinkError> {
        let line = serde_json::to_string(record)?;
        println!("{}", line);
        Ok(())
    }
}

/// Collects records in memory. Used by tests and dry runs.
#[derive(Default)]
pub struct MemorySink {
    pub records: Vec<JobRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordSink for MemorySink {
    fn emit(&mut self, record: &JobRecord) -> Result<(), SinkError> {
        self.records.push(record.clone());
        Ok(())
    }
}
