//! `campustrade-swaps` — swap offers and their status state machine.

pub mod offer;

pub use offer::{OfferAction, OfferStatus, SwapOffer};
