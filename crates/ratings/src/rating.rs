use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use campustrade_core::{ExchangeError, ExchangeResult, UserId};

/// Which lifecycle a completed exchange came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeKind {
    Sale,
    Rental,
    Swap,
}

impl core::fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            ExchangeKind::Sale => "sale",
            ExchangeKind::Rental => "rental",
            ExchangeKind::Swap => "swap",
        };
        f.write_str(s)
    }
}

/// Uniqueness key: one rating per (rater, counterpart, exchange).
///
/// `exchange_id` is the raw id of the order/request/offer; the kind keeps
/// the id spaces from colliding. The counterpart is part of the key so a
/// buyer can rate each distinct seller of a multi-seller order once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RatingKey {
    pub rater_id: UserId,
    pub counterpart_id: UserId,
    pub kind: ExchangeKind,
    pub exchange_id: Uuid,
}

/// A submitted rating row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub key: RatingKey,
    pub score: u8,
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Rating {
    pub fn new(
        key: RatingKey,
        score: u8,
        text: Option<String>,
        created_at: DateTime<Utc>,
    ) -> ExchangeResult<Self> {
        if !(1..=5).contains(&score) {
            return Err(ExchangeError::validation(format!(
                "rating score {score} is out of range [1, 5]"
            )));
        }
        if key.rater_id == key.counterpart_id {
            return Err(ExchangeError::validation("cannot rate yourself"));
        }
        Ok(Self {
            key,
            score,
            text,
            created_at,
        })
    }
}

/// The Rating Gate's answer: whether a rating is newly unlockable for this
/// (rater, counterpart, exchange) triple. Pure data; the submission
/// endpoint later inserts the actual row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingHint {
    pub key: RatingKey,
    pub should_rate: bool,
}
