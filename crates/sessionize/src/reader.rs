//! CSV event source.
//!
//! Reads access-log rows lazily and turns each into a typed
//! [`Event`]. The log is a headered CSV; only the `ip`, `date`, and `time`
//! columns are consumed, any others are ignored.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Deserialize;

use sessionize_core::Event;

/// Timestamp layout used by both the log's date+time columns and the
/// output rows.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One raw log row, selected by header name.
#[derive(Debug, Deserialize)]
struct LogRecord {
    ip: String,
    date: String,
    time: String,
}

impl LogRecord {
    /// Combine the date and time columns into a typed event.
    fn into_event(self) -> Result<Event> {
        let stamp = format!("{} {}", self.date, self.time);
        let timestamp = NaiveDateTime::parse_from_str(&stamp, TIMESTAMP_FORMAT)
            .with_context(|| format!("invalid timestamp '{stamp}' for client '{}'", self.ip))?;
        Ok(Event::new(self.ip, timestamp))
    }
}

/// Lazy iterator of events over an access log.
pub struct EventReader<R: Read = File> {
    records: csv::DeserializeRecordsIntoIter<R, LogRecord>,
}

impl EventReader<File> {
    /// Open the log file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open log file '{}'", path.display()))?;
        Ok(Self::from_reader(file))
    }
}

impl<R: Read> EventReader<R> {
    /// Build an event reader over any CSV source with a header row.
    pub fn from_reader(reader: R) -> Self {
        let csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        Self {
            records: csv_reader.into_deserialize(),
        }
    }
}

impl<R: Read> Iterator for EventReader<R> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(
            record
                .context("malformed log row")
                .and_then(LogRecord::into_event),
        )
    }
}
