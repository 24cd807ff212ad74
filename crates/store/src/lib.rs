//! `campustrade-store` — the transactional Persistent Store collaborator.
//!
//! The engine only ever touches durable state through [`ExchangeStore::in_txn`]:
//! a closure over a [`Txn`] that either commits wholesale or leaves nothing
//! behind. The in-memory implementation stages every mutation on a copy of
//! the state and swaps it in on `Ok`, which gives the compare-and-swap
//! `set_item_status(from, to)` the isolation the conflict rules require.

pub mod memory;
pub mod txn;

pub use memory::InMemoryStore;
pub use txn::{ExchangeStore, StoreState, Txn};
