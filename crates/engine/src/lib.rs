//! `campustrade-engine` — the Exchange Lifecycle Engine.
//!
//! Turns raw intents (rent, swap-offer, checkout, status change) into a
//! consistent sequence of state transitions across an item, a
//! request/offer record, and — for sales — a multi-item order. Every
//! operation runs as one store transaction: verify availability, mutate
//! item status, mutate request/order status, invalidate siblings, queue
//! notifications. Either all of it commits or none of it does.

pub mod conflict;
pub mod engine;
pub mod orders;
pub mod outbox;
pub mod ratings;
pub mod rentals;
pub mod swaps;

#[cfg(test)]
mod integration_tests;

pub use engine::{ExchangeEngine, ItemArchival};
pub use orders::{CheckoutLine, OrderCancellation, OrderCompletion};
pub use outbox::OutboxRelay;
pub use rentals::RentalStatusUpdate;
pub use swaps::SwapStatusUpdate;
