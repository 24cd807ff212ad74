//! `campustrade-notifications` — notification records and the delivery sink.
//!
//! Notifications are written in the same transaction as the state change
//! that caused them (outbox pattern) and handed to a `NotificationSink`
//! afterwards, best-effort. A sink failure never rolls anything back.

pub mod notification;
pub mod sink;

pub use notification::{Notification, NotificationKind};
pub use sink::{InMemorySink, NotificationSink, TracingSink};
