//! Input event type.

use chrono::NaiveDateTime;

/// One access-log record: a single request from one client.
///
/// Events are immutable once created and are consumed by
/// [`SessionTracker::fold`](crate::SessionTracker::fold).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Client identifier (e.g., the requesting IP address).
    pub client_id: String,

    /// When the request was made.
    pub timestamp: NaiveDateTime,
}

impl Event {
    /// Create a new event.
    pub fn new(client_id: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            client_id: client_id.into(),
            timestamp,
        }
    }
}
