use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use campustrade_core::{ActorRole, Entity, ExchangeError, ExchangeResult, ItemId, OfferId, UserId};

/// Swap offer status lifecycle; isomorphic to rental requests minus dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
    Completed,
}

impl OfferStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OfferStatus::Rejected | OfferStatus::Cancelled | OfferStatus::Completed
        )
    }
}

impl core::fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            OfferStatus::Pending => "pending",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Rejected => "rejected",
            OfferStatus::Cancelled => "cancelled",
            OfferStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Status-mutating actions on a swap offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferAction {
    Accept,
    Reject,
    Cancel,
    Complete,
}

impl OfferAction {
    pub fn for_target(target: OfferStatus) -> ExchangeResult<Self> {
        match target {
            OfferStatus::Accepted => Ok(OfferAction::Accept),
            OfferStatus::Rejected => Ok(OfferAction::Reject),
            OfferStatus::Cancelled => Ok(OfferAction::Cancel),
            OfferStatus::Completed => Ok(OfferAction::Complete),
            OfferStatus::Pending => Err(ExchangeError::validation(
                "an offer cannot be moved back to pending",
            )),
        }
    }
}

impl core::fmt::Display for OfferAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            OfferAction::Accept => "accept",
            OfferAction::Reject => "reject",
            OfferAction::Cancel => "cancel",
            OfferAction::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// An item-for-item trade proposal against a swap listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOffer {
    pub id: OfferId,
    /// The listing being asked for.
    pub target_item_id: ItemId,
    pub requester_id: UserId,
    pub owner_id: UserId,
    /// The item put up in return, when the requester offers a listed one.
    pub offered_item_id: Option<ItemId>,
    pub status: OfferStatus,
    pub note: Option<String>,
    /// Populated on reject, including the auto-reject of losing siblings.
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SwapOffer {
    #[allow(clippy::too_many_arguments)]
    pub fn new_pending(
        id: OfferId,
        target_item_id: ItemId,
        requester_id: UserId,
        owner_id: UserId,
        offered_item_id: Option<ItemId>,
        note: Option<String>,
        created_at: DateTime<Utc>,
    ) -> ExchangeResult<Self> {
        if requester_id == owner_id {
            return Err(ExchangeError::validation(
                "cannot offer a swap on your own item",
            ));
        }
        if offered_item_id == Some(target_item_id) {
            return Err(ExchangeError::validation(
                "offered item and target item are the same",
            ));
        }
        Ok(Self {
            id,
            target_item_id,
            requester_id,
            owner_id,
            offered_item_id,
            status: OfferStatus::Pending,
            note,
            rejection_reason: None,
            created_at,
            updated_at: created_at,
        })
    }

    pub fn role_of(&self, actor: UserId) -> ExchangeResult<ActorRole> {
        if actor == self.owner_id {
            Ok(ActorRole::Owner)
        } else if actor == self.requester_id {
            Ok(ActorRole::Requester)
        } else {
            Err(ExchangeError::forbidden(
                "actor is not a party to this swap offer",
            ))
        }
    }

    /// Central transition table; see `RentalRequest::transition`.
    pub fn transition(&self, action: OfferAction, role: ActorRole) -> ExchangeResult<OfferStatus> {
        if self.status.is_terminal() {
            return Err(ExchangeError::invalid_transition(format!(
                "offer is already {} (terminal)",
                self.status
            )));
        }

        let next = match (self.status, action) {
            (OfferStatus::Pending, OfferAction::Accept) => {
                require_owner(role, "accept")?;
                OfferStatus::Accepted
            }
            (OfferStatus::Pending, OfferAction::Reject) => {
                require_owner(role, "reject")?;
                OfferStatus::Rejected
            }
            (OfferStatus::Pending | OfferStatus::Accepted, OfferAction::Cancel) => {
                OfferStatus::Cancelled
            }
            (OfferStatus::Accepted, OfferAction::Complete) => {
                require_owner(role, "complete")?;
                OfferStatus::Completed
            }
            (from, action) => {
                return Err(ExchangeError::invalid_transition(format!(
                    "cannot {action} a {from} swap offer"
                )));
            }
        };

        Ok(next)
    }

    pub fn advance(&mut self, next: OfferStatus, reason: Option<String>, at: DateTime<Utc>) {
        self.status = next;
        if next == OfferStatus::Rejected && reason.is_some() {
            self.rejection_reason = reason;
        }
        self.updated_at = at;
    }

    pub fn is_pending(&self) -> bool {
        self.status == OfferStatus::Pending
    }
}

impl Entity for SwapOffer {
    type Id = OfferId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn require_owner(role: ActorRole, action: &str) -> ExchangeResult<()> {
    if role != ActorRole::Owner {
        return Err(ExchangeError::forbidden(format!(
            "only the item owner may {action} a swap offer"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer() -> SwapOffer {
        SwapOffer::new_pending(
            OfferId::new(),
            ItemId::new(),
            UserId::new(),
            UserId::new(),
            Some(ItemId::new()),
            None,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn owner_cannot_offer_on_own_item() {
        let owner = UserId::new();
        let err = SwapOffer::new_pending(
            OfferId::new(),
            ItemId::new(),
            owner,
            owner,
            None,
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, ExchangeError::Validation(_)));
    }

    #[test]
    fn offered_item_must_differ_from_target() {
        let target = ItemId::new();
        let err = SwapOffer::new_pending(
            OfferId::new(),
            target,
            UserId::new(),
            UserId::new(),
            Some(target),
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, ExchangeError::Validation(_)));
    }

    #[test]
    fn accept_then_complete_is_owner_only() {
        let mut o = offer();
        let next = o.transition(OfferAction::Accept, ActorRole::Owner).unwrap();
        o.advance(next, None, Utc::now());

        let err = o
            .transition(OfferAction::Complete, ActorRole::Requester)
            .unwrap_err();
        assert!(matches!(err, ExchangeError::Forbidden(_)));

        let next = o.transition(OfferAction::Complete, ActorRole::Owner).unwrap();
        assert_eq!(next, OfferStatus::Completed);
    }

    #[test]
    fn reject_records_reason() {
        let mut o = offer();
        let next = o.transition(OfferAction::Reject, ActorRole::Owner).unwrap();
        o.advance(next, Some("not interested".to_string()), Utc::now());
        assert_eq!(o.status, OfferStatus::Rejected);
        assert_eq!(o.rejection_reason.as_deref(), Some("not interested"));
    }

    #[test]
    fn terminal_offers_reject_all_actions() {
        let mut o = offer();
        o.advance(OfferStatus::Completed, None, Utc::now());
        let err = o.transition(OfferAction::Cancel, ActorRole::Owner).unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidTransition(_)));
    }
}
