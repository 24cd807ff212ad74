use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use campustrade_core::{Entity, NotificationId, UserId};

/// Type tag used by clients to route/deep-link the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    RentalRequest,
    RentalUpdate,
    SwapOffer,
    SwapUpdate,
    Order,
    OrderUpdate,
    Rating,
}

/// Append-only notification row, independently read/unread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub sender_id: Option<UserId>,
    pub kind: NotificationKind,
    pub message: String,
    pub deep_link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        recipient_id: UserId,
        sender_id: Option<UserId>,
        kind: NotificationKind,
        message: impl Into<String>,
        deep_link: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            recipient_id,
            sender_id,
            kind,
            message: message.into(),
            deep_link,
            is_read: false,
            created_at,
        }
    }
}

impl Entity for Notification {
    type Id = NotificationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
