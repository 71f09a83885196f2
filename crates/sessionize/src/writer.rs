//! Session sink.
//!
//! Formats closed sessions as CSV rows and streams them to the output
//! file, in the exact order the tracker returned them.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use sessionize_core::Session;

use crate::reader::TIMESTAMP_FORMAT;

/// Writes closed sessions as headerless CSV rows:
/// `client_id, first_seen, last_seen, duration, request_count`.
pub struct SessionWriter<W: Write = File> {
    writer: csv::Writer<W>,
}

impl SessionWriter<File> {
    /// Create (or truncate) the output file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("failed to create output file '{}'", path.display()))?;
        Ok(Self::from_writer(file))
    }
}

impl<W: Write> SessionWriter<W> {
    /// Build a session writer over any byte sink.
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(writer),
        }
    }

    /// Write one closed session.
    pub fn write_session(&mut self, session: &Session) -> Result<()> {
        self.writer
            .write_record(record_fields(session))
            .with_context(|| format!("failed to write session for '{}'", session.client_id))
    }

    /// Flush buffered rows to the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("failed to flush output")
    }
}

/// Output row fields for one session. Duration uses the inclusive
/// convention: a one-request session reports 1.
fn record_fields(session: &Session) -> [String; 5] {
    [
        session.client_id.clone(),
        session.first_seen.format(TIMESTAMP_FORMAT).to_string(),
        session.last_seen.format(TIMESTAMP_FORMAT).to_string(),
        session.duration_secs().to_string(),
        session.request_count.to_string(),
    ]
}
