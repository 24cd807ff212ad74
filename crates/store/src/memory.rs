//! In-memory store with commit-on-success transactions.

use std::sync::Mutex;

use campustrade_core::{ExchangeError, ExchangeResult};
use campustrade_notifications::Notification;

use crate::txn::{ExchangeStore, StoreState, Txn};

/// In-memory implementation of [`ExchangeStore`].
///
/// One writer at a time: the mutex serializes transactions, so the staged
/// `from`-status checks see a stable snapshot (effectively serializable
/// isolation). Mutations run against a clone of the state and replace it
/// only when the closure returns `Ok`, so a mid-transaction failure leaves
/// no partial write behind. Intended for tests/dev; not optimized.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExchangeStore for InMemoryStore {
    fn in_txn<T, F>(&self, op: F) -> ExchangeResult<T>
    where
        F: FnOnce(&mut Txn<'_>) -> ExchangeResult<T>,
    {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| ExchangeError::internal("store lock poisoned"))?;

        let mut staged = guard.clone();
        let out = op(&mut Txn::new(&mut staged))?;

        *guard = staged;
        Ok(out)
    }

    fn drain_outbox(&self) -> Vec<Notification> {
        match self.state.lock() {
            Ok(mut guard) => guard.outbox.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }
}
