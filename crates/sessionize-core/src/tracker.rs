//! The session-tracking state machine.

use std::collections::{HashMap, VecDeque};

use chrono::NaiveDateTime;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::event::Event;
use crate::session::Session;

/// Tracks the currently-open sessions for a stream of ordered events.
///
/// Open sessions are kept in first-observation order: the order in which
/// each currently-open client first appeared since its session was
/// (re)opened. Evicted and flushed sessions come back in that order,
/// regardless of how updates were interleaved.
///
/// The tracker assumes events arrive with non-decreasing timestamps. It
/// does not detect or correct out-of-order input; a timestamp earlier than
/// the last one folded can make sessions age backward or evict incorrectly.
#[derive(Debug)]
pub struct SessionTracker {
    /// Open sessions keyed by client identifier.
    open: HashMap<String, Session>,

    /// Client keys in first-observation order. Mirrors `open` exactly.
    order: VecDeque<String>,

    /// Maximum allowed gap, in seconds, between a session's last activity
    /// and the current clock before it is considered ended.
    inactivity_period: i64,

    /// Timestamp of the most recently folded event. None until the first
    /// fold.
    clock: Option<NaiveDateTime>,
}

impl SessionTracker {
    /// Create a tracker with the given inactivity period in seconds.
    ///
    /// Fails fast if the period is negative; the eviction rule assumes a
    /// non-negative window.
    pub fn new(inactivity_period: i64) -> Result<Self> {
        if inactivity_period < 0 {
            return Err(Error::InvalidInactivityPeriod(inactivity_period));
        }

        Ok(Self {
            open: HashMap::new(),
            order: VecDeque::new(),
            inactivity_period,
            clock: None,
        })
    }

    /// Fold one event into the tracker, returning the sessions it closed.
    ///
    /// Advances the clock to the event's timestamp, evicts every session
    /// whose last activity now falls outside the inactivity window, then
    /// advances the event's client session (opening a fresh one if the
    /// client has no open session — including when its previous session was
    /// just evicted by this same call).
    ///
    /// Eviction happens before the update so that a client returning after
    /// a gap larger than the inactivity period closes its old session and
    /// starts over at `request_count = 1` rather than extending it. The
    /// window boundary is strict: a gap exactly equal to the inactivity
    /// period keeps a session open.
    pub fn fold(&mut self, event: Event) -> Vec<Session> {
        let Event {
            client_id,
            timestamp,
        } = event;
        self.clock = Some(timestamp);

        let closed = self.evict_inactive(timestamp);

        // Explicit lookup-or-open: a client without an open session gets a
        // fresh one appended at the end of the observation order.
        if !self.open.contains_key(&client_id) {
            trace!(client_id = %client_id, timestamp = %timestamp, "opening session");
            self.order.push_back(client_id.clone());
            self.open
                .insert(client_id.clone(), Session::open(client_id.clone(), timestamp));
        }
        if let Some(session) = self.open.get_mut(&client_id) {
            session.last_seen = timestamp;
            session.request_count += 1;
        }

        closed
    }

    /// Close and return every remaining open session, in first-observation
    /// order.
    ///
    /// Intended to be called once, after the input stream is exhausted.
    /// Safe to call before any fold, and idempotent: later calls return an
    /// empty sequence.
    pub fn flush(&mut self) -> Vec<Session> {
        let open = &mut self.open;
        let closed: Vec<Session> = self
            .order
            .drain(..)
            .filter_map(|client_id| open.remove(&client_id))
            .collect();

        if !closed.is_empty() {
            debug!(count = closed.len(), "flushed remaining sessions");
        }

        closed
    }

    /// Remove and return every session whose last activity is more than
    /// `inactivity_period` seconds before `now`, preserving their relative
    /// order.
    fn evict_inactive(&mut self, now: NaiveDateTime) -> Vec<Session> {
        let inactivity_period = self.inactivity_period;
        let open = &mut self.open;
        let mut closed = Vec::new();

        self.order.retain(|client_id| {
            let inactive = open
                .get(client_id)
                .is_some_and(|s| (now - s.last_seen).num_seconds() > inactivity_period);
            if inactive {
                if let Some(session) = open.remove(client_id) {
                    closed.push(session);
                }
            }
            !inactive
        });

        if !closed.is_empty() {
            debug!(count = closed.len(), clock = %now, "evicted inactive sessions");
        }

        closed
    }

    /// Number of currently open sessions.
    pub fn len(&self) -> usize {
        self.open.len()
    }

    /// Check whether no sessions are open.
    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    /// The configured inactivity period in seconds.
    pub fn inactivity_period(&self) -> i64 {
        self.inactivity_period
    }

    /// Timestamp of the most recently folded event, if any.
    pub fn clock(&self) -> Option<NaiveDateTime> {
        self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(secs: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + chrono::Duration::seconds(i64::from(secs))
    }

    fn event(client_id: &str, secs: u32) -> Event {
        Event::new(client_id, ts(secs))
    }

    #[test]
    fn test_negative_period_rejected() {
        let result = SessionTracker::new(-1);
        assert!(matches!(result, Err(Error::InvalidInactivityPeriod(-1))));
    }

    #[test]
    fn test_first_event_opens_session() {
        let mut tracker = SessionTracker::new(2).unwrap();

        let closed = tracker.fold(event("1.1.1.1", 0));

        assert!(closed.is_empty());
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.clock(), Some(ts(0)));
    }

    #[test]
    fn test_gap_equal_to_period_stays_open() {
        let mut tracker = SessionTracker::new(2).unwrap();

        tracker.fold(event("1.1.1.1", 0));
        let closed = tracker.fold(event("1.1.1.1", 2));

        assert!(closed.is_empty());
        assert_eq!(tracker.len(), 1);

        let sessions = tracker.flush();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].request_count, 2);
        assert_eq!(sessions[0].first_seen, ts(0));
        assert_eq!(sessions[0].last_seen, ts(2));
    }

    #[test]
    fn test_gap_beyond_period_closes() {
        let mut tracker = SessionTracker::new(2).unwrap();

        tracker.fold(event("1.1.1.1", 0));
        let closed = tracker.fold(event("1.1.1.1", 3));

        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].request_count, 1);
        assert_eq!(closed[0].last_seen, ts(0));
    }

    #[test]
    fn test_reopened_session_starts_fresh() {
        let mut tracker = SessionTracker::new(1).unwrap();

        tracker.fold(event("1.1.1.1", 0));
        tracker.fold(event("1.1.1.1", 1));
        let closed = tracker.fold(event("1.1.1.1", 10));
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].request_count, 2);

        // The new session does not inherit the old one's count.
        let sessions = tracker.flush();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].request_count, 1);
        assert_eq!(sessions[0].first_seen, ts(10));
    }

    #[test]
    fn test_zero_period_keeps_current_event_open() {
        let mut tracker = SessionTracker::new(0).unwrap();

        // Age of the just-touched session is exactly 0, not > 0.
        let closed = tracker.fold(event("1.1.1.1", 0));
        assert!(closed.is_empty());
        assert_eq!(tracker.len(), 1);

        // Same instant again: still within the window.
        let closed = tracker.fold(event("1.1.1.1", 0));
        assert!(closed.is_empty());

        // One second later: the old activity is now stale.
        let closed = tracker.fold(event("1.1.1.1", 1));
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].request_count, 2);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_eviction_triggered_by_other_client() {
        let mut tracker = SessionTracker::new(2).unwrap();

        tracker.fold(event("1.1.1.1", 0));
        let closed = tracker.fold(event("2.2.2.2", 5));

        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].client_id, "1.1.1.1");
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_eviction_preserves_first_observation_order() {
        let mut tracker = SessionTracker::new(3).unwrap();

        // A, B, A, C interleaved, all within the window.
        tracker.fold(event("a", 0));
        tracker.fold(event("b", 1));
        tracker.fold(event("a", 2));
        tracker.fold(event("c", 3));

        // All three go inactive simultaneously.
        let closed = tracker.fold(event("d", 10));
        let order: Vec<&str> = closed.iter().map(|s| s.client_id.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_flush_preserves_first_observation_order() {
        let mut tracker = SessionTracker::new(60).unwrap();

        tracker.fold(event("a", 0));
        tracker.fold(event("b", 1));
        tracker.fold(event("a", 2));
        tracker.fold(event("c", 3));

        let closed = tracker.flush();
        let order: Vec<&str> = closed.iter().map(|s| s.client_id.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_reopening_moves_client_to_back_of_order() {
        let mut tracker = SessionTracker::new(2).unwrap();

        tracker.fold(event("a", 0));
        tracker.fold(event("b", 4));
        // a's first session was evicted above; this reopens it after b.
        tracker.fold(event("a", 5));

        let closed = tracker.flush();
        let order: Vec<&str> = closed.iter().map(|s| s.client_id.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn test_flush_is_complete_and_idempotent() {
        let mut tracker = SessionTracker::new(2).unwrap();

        tracker.fold(event("1.1.1.1", 0));
        tracker.fold(event("2.2.2.2", 1));

        let closed = tracker.flush();
        assert_eq!(closed.len(), 2);
        assert!(tracker.is_empty());

        assert!(tracker.flush().is_empty());
    }

    #[test]
    fn test_flush_before_any_fold_is_safe() {
        let mut tracker = SessionTracker::new(2).unwrap();
        assert!(tracker.flush().is_empty());
        assert_eq!(tracker.clock(), None);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut tracker = SessionTracker::new(2).unwrap();

        assert!(tracker.fold(event("9.9.9.9", 0)).is_empty());
        assert!(tracker.fold(event("9.9.9.9", 2)).is_empty());

        let closed = tracker.fold(event("9.9.9.9", 10));
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].first_seen, ts(0));
        assert_eq!(closed[0].last_seen, ts(2));
        assert_eq!(closed[0].request_count, 2);
        assert_eq!(closed[0].duration_secs(), 3);

        let remaining = tracker.flush();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].first_seen, ts(10));
        assert_eq!(remaining[0].last_seen, ts(10));
        assert_eq!(remaining[0].request_count, 1);
        assert_eq!(remaining[0].duration_secs(), 1);
    }
}
