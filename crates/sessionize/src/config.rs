//! Inactivity-threshold file reading.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

/// Read the inactivity period, in seconds, from a text file holding a
/// single integer.
///
/// The whole trimmed file content is parsed, so multi-digit periods and a
/// trailing newline are both fine. Negative values parse here and are
/// rejected by the tracker's constructor.
pub fn read_inactivity_period(path: &Path) -> Result<i64> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read inactivity file '{}'", path.display()))?;
    let trimmed = raw.trim();

    let period: i64 = trimmed
        .parse()
        .with_context(|| format!("invalid inactivity period '{trimmed}' (expected an integer)"))?;

    debug!(period_secs = period, "read inactivity period");
    Ok(period)
}
