//! Session tracking for access-log sessionization.
//!
//! This crate provides the state machine that folds a time-ordered stream
//! of access-log events into completed sessions:
//! - Events carry a client identifier and a timestamp
//! - A session is a contiguous burst of activity from one client
//! - Sessions close once the client goes quiet for longer than a
//!   configured inactivity period, or at end-of-stream
//!
//! # Example
//!
//! ```rust,ignore
//! use sessionize_core::{Event, SessionTracker};
//!
//! let mut tracker = SessionTracker::new(2)?;
//! for event in events {
//!     for session in tracker.fold(event) {
//!         sink.write(session);
//!     }
//! }
//! for session in tracker.flush() {
//!     sink.write(session);
//! }
//! ```

mod error;
mod event;
mod session;
mod tracker;

pub use error::{Error, Result};
pub use event::Event;
pub use session::Session;
pub use tracker::SessionTracker;
