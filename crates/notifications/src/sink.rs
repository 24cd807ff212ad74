//! Delivery sink abstraction (external collaborator interface only).

use std::sync::{Arc, Mutex};

use crate::notification::Notification;

/// Fire-and-forget delivery target for notifications.
///
/// Implementations push to mail queues, websockets, mobile push, etc.
/// The relay treats `Err` as "log and move on" — delivery is best-effort
/// and never participates in the state transaction.
pub trait NotificationSink: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn enqueue(&self, notification: &Notification) -> Result<(), Self::Error>;
}

impl<S> NotificationSink for Arc<S>
where
    S: NotificationSink + ?Sized,
{
    type Error = S::Error;

    fn enqueue(&self, notification: &Notification) -> Result<(), Self::Error> {
        (**self).enqueue(notification)
    }
}

/// In-memory sink for tests/dev: collects everything it is handed.
#[derive(Debug, Default)]
pub struct InMemorySink {
    delivered: Mutex<Vec<Notification>>,
}

#[derive(Debug)]
pub enum InMemorySinkError {
    /// Enqueue failed due to internal lock poisoning.
    Poisoned,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl NotificationSink for InMemorySink {
    type Error = InMemorySinkError;

    fn enqueue(&self, notification: &Notification) -> Result<(), Self::Error> {
        let mut delivered = self
            .delivered
            .lock()
            .map_err(|_| InMemorySinkError::Poisoned)?;
        delivered.push(notification.clone());
        Ok(())
    }
}

/// Default production sink until a real delivery channel is wired in:
/// logs each notification at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    type Error = core::convert::Infallible;

    fn enqueue(&self, notification: &Notification) -> Result<(), Self::Error> {
        tracing::info!(
            recipient = %notification.recipient_id,
            kind = ?notification.kind,
            message = %notification.message,
            "notification enqueued"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationKind;
    use campustrade_core::UserId;
    use chrono::Utc;

    #[test]
    fn in_memory_sink_collects_notifications() {
        let sink = InMemorySink::new();
        let n = Notification::new(
            UserId::new(),
            None,
            NotificationKind::RentalRequest,
            "New rental request for your item",
            None,
            Utc::now(),
        );
        sink.enqueue(&n).unwrap();
        assert_eq!(sink.delivered(), vec![n]);
    }
}
