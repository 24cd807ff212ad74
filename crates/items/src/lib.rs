//! `campustrade-items` — the Item Ledger entity.
//!
//! An item's allocation status is the single source of truth for whether it
//! can be sold, rented, or swapped. Status never changes except through the
//! store's optimistic compare-and-swap, driven by the engine.

pub mod item;

pub use item::{AllocationStatus, Item, ListingKind};
