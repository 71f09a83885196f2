//! Session aggregate type.

use chrono::NaiveDateTime;

/// Aggregate state for one client's current burst of activity.
///
/// A session is created on the client's first event, advanced on every
/// subsequent event while it remains open, and handed to the caller once
/// the tracker evicts it. A closed session is never resurrected; a later
/// event from the same client starts a fresh one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Client identifier this session belongs to.
    pub client_id: String,

    /// Timestamp of the first request in the session.
    pub first_seen: NaiveDateTime,

    /// Timestamp of the most recent request in the session.
    pub last_seen: NaiveDateTime,

    /// Number of requests folded into the session.
    pub request_count: u64,
}

impl Session {
    /// Open a session at the given instant, before any request is counted.
    ///
    /// The tracker increments `request_count` as part of folding the event
    /// that opened the session, so a freshly opened session starts at zero.
    pub fn open(client_id: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            client_id: client_id.into(),
            first_seen: timestamp,
            last_seen: timestamp,
            request_count: 0,
        }
    }

    /// Session duration in seconds, inclusive of both endpoints.
    ///
    /// A one-request session has duration 1, and a session spanning N
    /// seconds end-to-end has duration N + 1. Downstream output is defined
    /// in terms of this convention.
    pub fn duration_secs(&self) -> i64 {
        (self.last_seen - self.first_seen).num_seconds() + 1
    }
}
