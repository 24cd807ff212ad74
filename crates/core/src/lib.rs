//! `campustrade-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod actor;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use actor::ActorRole;
pub use entity::Entity;
pub use error::{ExchangeError, ExchangeResult};
pub use id::{ItemId, NotificationId, OfferId, OrderId, RequestId, UserId};
pub use value_object::ValueObject;
