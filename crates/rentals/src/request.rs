use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use campustrade_core::{
    ActorRole, Entity, ExchangeError, ExchangeResult, ItemId, RequestId, UserId,
};

use crate::date_range::DateRange;

/// Rental request status lifecycle.
///
/// Declined/cancelled/completed are terminal: no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
    Cancelled,
    Completed,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestStatus::Declined | RequestStatus::Cancelled | RequestStatus::Completed
        )
    }
}

impl core::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Declined => "declined",
            RequestStatus::Cancelled => "cancelled",
            RequestStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Status-mutating actions on a rental request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestAction {
    Accept,
    Decline,
    Cancel,
    Complete,
}

impl RequestAction {
    /// Map a desired target status onto the action that reaches it.
    /// `pending` is never a valid target (no re-opening).
    pub fn for_target(target: RequestStatus) -> ExchangeResult<Self> {
        match target {
            RequestStatus::Accepted => Ok(RequestAction::Accept),
            RequestStatus::Declined => Ok(RequestAction::Decline),
            RequestStatus::Cancelled => Ok(RequestAction::Cancel),
            RequestStatus::Completed => Ok(RequestAction::Complete),
            RequestStatus::Pending => Err(ExchangeError::validation(
                "a request cannot be moved back to pending",
            )),
        }
    }
}

impl core::fmt::Display for RequestAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            RequestAction::Accept => "accept",
            RequestAction::Decline => "decline",
            RequestAction::Cancel => "cancel",
            RequestAction::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// A request to rent an item for an inclusive date window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalRequest {
    pub id: RequestId,
    pub item_id: ItemId,
    pub requester_id: UserId,
    pub owner_id: UserId,
    pub window: DateRange,
    pub status: RequestStatus,
    /// Free-text note; auto-populated on bulk decline of losing siblings.
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RentalRequest {
    pub fn new_pending(
        id: RequestId,
        item_id: ItemId,
        requester_id: UserId,
        owner_id: UserId,
        window: DateRange,
        comment: Option<String>,
        created_at: DateTime<Utc>,
    ) -> ExchangeResult<Self> {
        if requester_id == owner_id {
            return Err(ExchangeError::validation(
                "cannot request a rental on your own item",
            ));
        }
        Ok(Self {
            id,
            item_id,
            requester_id,
            owner_id,
            window,
            status: RequestStatus::Pending,
            comment,
            created_at,
            updated_at: created_at,
        })
    }

    /// Resolve the acting user into a role, or refuse outsiders.
    pub fn role_of(&self, actor: UserId) -> ExchangeResult<ActorRole> {
        if actor == self.owner_id {
            Ok(ActorRole::Owner)
        } else if actor == self.requester_id {
            Ok(ActorRole::Requester)
        } else {
            Err(ExchangeError::forbidden(
                "actor is not a party to this rental request",
            ))
        }
    }

    /// The central transition table.
    ///
    /// Validates both the edge (current status → action) and the actor
    /// role allowed to take it. Returns the resulting status without
    /// mutating; the caller applies it inside a transaction.
    pub fn transition(&self, action: RequestAction, role: ActorRole) -> ExchangeResult<RequestStatus> {
        if self.status.is_terminal() {
            return Err(ExchangeError::invalid_transition(format!(
                "request is already {} (terminal)",
                self.status
            )));
        }

        let next = match (self.status, action) {
            (RequestStatus::Pending, RequestAction::Accept) => {
                require_owner(role, "accept")?;
                RequestStatus::Accepted
            }
            (RequestStatus::Pending, RequestAction::Decline) => {
                require_owner(role, "decline")?;
                RequestStatus::Declined
            }
            (RequestStatus::Pending | RequestStatus::Accepted, RequestAction::Cancel) => {
                RequestStatus::Cancelled
            }
            (RequestStatus::Accepted, RequestAction::Complete) => {
                require_owner(role, "complete")?;
                RequestStatus::Completed
            }
            (from, action) => {
                return Err(ExchangeError::invalid_transition(format!(
                    "cannot {action} a {from} rental request"
                )));
            }
        };

        Ok(next)
    }

    /// Apply a validated transition.
    pub fn advance(&mut self, next: RequestStatus, comment: Option<String>, at: DateTime<Utc>) {
        self.status = next;
        if comment.is_some() {
            self.comment = comment;
        }
        self.updated_at = at;
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

impl Entity for RentalRequest {
    type Id = RequestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn require_owner(role: ActorRole, action: &str) -> ExchangeResult<()> {
    if role != ActorRole::Owner {
        return Err(ExchangeError::forbidden(format!(
            "only the item owner may {action} a rental request"
        )));
    }
    Ok(())
}
