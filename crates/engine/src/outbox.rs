//! Outbox relay: moves committed notifications to the delivery sink.
//!
//! Notification rows are written inside the same transaction as the state
//! change that caused them (transactional outbox). This relay drains the
//! queue afterwards and hands each entry to the sink. Delivery is
//! best-effort: a sink failure is logged and the loop continues, it never
//! affects the already-committed state.

use campustrade_notifications::NotificationSink;
use campustrade_store::ExchangeStore;

pub struct OutboxRelay<S, K> {
    store: S,
    sink: K,
}

impl<S: ExchangeStore, K: NotificationSink> OutboxRelay<S, K> {
    pub fn new(store: S, sink: K) -> Self {
        Self { store, sink }
    }

    /// Drain the outbox once, returning how many notifications were handed
    /// to the sink. Each entry is removed from the queue exactly once; the
    /// durable notification rows stay untouched.
    pub fn drain(&self) -> usize {
        let pending = self.store.drain_outbox();
        let mut delivered = 0;
        for notification in &pending {
            match self.sink.enqueue(notification) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        notification = %notification.id,
                        recipient = %notification.recipient_id,
                        error = ?e,
                        "notification delivery failed"
                    );
                }
            }
        }
        if delivered > 0 {
            tracing::debug!(delivered, "outbox drained");
        }
        delivered
    }
}
