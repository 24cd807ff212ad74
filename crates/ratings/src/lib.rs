//! `campustrade-ratings` — ratings and the Rating Gate key.
//!
//! At most one rating exists per (rater, counterpart, exchange kind,
//! exchange id); the store's uniqueness constraint on `RatingKey` is the
//! final arbiter, not application logic.

pub mod rating;

pub use rating::{ExchangeKind, Rating, RatingHint, RatingKey};
