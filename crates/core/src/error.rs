//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// Closed error taxonomy for exchange operations.
///
/// Every engine operation fails with exactly one of these kinds; the HTTP
/// boundary maps each kind to a status code in a single place. Keep this
/// focused on deterministic business failures — infrastructure failures are
/// folded into `Internal` and are safe to retry wholesale (nothing partial
/// is ever committed).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    /// An item/request/offer/order id did not resolve. Never retried.
    #[error("not found: {0}")]
    NotFound(String),

    /// A status change is not permitted from the entity's current state.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Lost a race for a shared resource (optimistic status check failed).
    /// Retryable from the caller's side; the engine never auto-retries.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A checkout line targeted an item that is not `available`.
    #[error("item unavailable: {0}")]
    ItemUnavailable(String),

    /// Malformed input (bad date range, empty order lines, score out of
    /// range). Surfaced before any side effect is performed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A rating already exists for (rater, counterpart, exchange kind,
    /// exchange id).
    #[error("duplicate rating")]
    DuplicateRating,

    /// The actor is not a party to the entity it tried to mutate.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Unexpected store failure; the enclosing transaction was rolled back.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ExchangeError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn item_unavailable(msg: impl Into<String>) -> Self {
        Self::ItemUnavailable(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True for the kinds a caller may reasonably retry after re-fetching.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Conflict(_) | Self::ItemUnavailable(_) | Self::Internal(_)
        )
    }
}
