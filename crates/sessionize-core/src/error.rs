//! Error types for session tracking.

/// Error type for session tracking operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configured inactivity period is negative.
    #[error("invalid inactivity period: {0} (must be a non-negative number of seconds)")]
    InvalidInactivityPeriod(i64),
}

/// Result type for session tracking operations.
pub type Result<T> = std::result::Result<T, Error>;
