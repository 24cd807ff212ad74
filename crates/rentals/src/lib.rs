//! `campustrade-rentals` — rental requests and their status state machine.

pub mod date_range;
pub mod request;

pub use date_range::DateRange;
pub use request::{RentalRequest, RequestAction, RequestStatus};
