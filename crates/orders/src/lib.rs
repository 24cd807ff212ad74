//! `campustrade-orders` — multi-line sale orders.
//!
//! An order groups one or more items into a priced sale. Line prices are
//! snapshotted at checkout and never recomputed from the live listing.

pub mod order;

pub use order::{MeetupDetails, Order, OrderLine, OrderStatus};
