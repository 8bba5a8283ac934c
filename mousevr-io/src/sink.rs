use crate::error::SinkError;
use mousevr_core::{LogEntry, LogSink};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Serialize)]
struct Stamped<'a> {
    timestamp_ms: u64,
    #[serde(flatten)]
    entry: &'a LogEntry,
}

/// Writes one JSON object per record, flushed after every line
pub struct JsonLinesSink<W: Write> {
    out: W,
    epoch: Instant,
    written: u64,
}

impl JsonLinesSink<BufWriter<File>> {
    /// Appends to `path`, creating it if needed
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        info!(path = %path.display(), "trial log opened");
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            epoch: Instant::now(),
            written: 0,
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_entry(&mut self, entry: &LogEntry) -> Result<(), SinkError> {
        let line = Stamped {
            timestamp_ms: self.epoch.elapsed().as_millis() as u64,
            entry,
        };
        serde_json::to_writer(&mut self.out, &line)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> LogSink for JsonLinesSink<W> {
    fn record(&mut self, entry: LogEntry) {
        match self.write_entry(&entry) {
            Ok(()) => self.written += 1,
            Err(e) => warn!("dropping log record: {}", e),
        }
    }
}
