//! Swap lifecycle operations.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use campustrade_core::{ExchangeError, ExchangeResult, ItemId, OfferId, UserId};
use campustrade_items::{AllocationStatus, ListingKind};
use campustrade_notifications::{Notification, NotificationKind};
use campustrade_ratings::{ExchangeKind, RatingHint, RatingKey};
use campustrade_store::{ExchangeStore, Txn};
use campustrade_swaps::{OfferAction, OfferStatus, SwapOffer};

use crate::conflict;
use crate::engine::ExchangeEngine;

/// Outcome of a swap status change; mirrors `RentalStatusUpdate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapStatusUpdate {
    pub offer: SwapOffer,
    pub auto_rejected: Vec<OfferId>,
    pub ratings: Vec<RatingHint>,
}

impl<S: ExchangeStore> ExchangeEngine<S> {
    /// Create a pending swap offer and notify the target item's owner.
    pub fn offer_swap(
        &self,
        target_item_id: ItemId,
        requester_id: UserId,
        offered_item_id: Option<ItemId>,
        note: Option<String>,
    ) -> ExchangeResult<SwapOffer> {
        let now = Utc::now();

        let offer = self.store().in_txn(|txn| {
            let target = txn.item(target_item_id)?;
            target.ensure_kind(ListingKind::Swap)?;
            if target.status == AllocationStatus::Archived {
                return Err(ExchangeError::validation("item is no longer listed"));
            }

            if let Some(offered_id) = offered_item_id {
                let offered = txn.item(offered_id)?;
                if !offered.is_owned_by(requester_id) {
                    return Err(ExchangeError::forbidden(
                        "offered item does not belong to the requester",
                    ));
                }
                if offered.status == AllocationStatus::Archived {
                    return Err(ExchangeError::validation("offered item is no longer listed"));
                }
            }

            let offer = SwapOffer::new_pending(
                OfferId::new(),
                target_item_id,
                requester_id,
                target.owner_id,
                offered_item_id,
                note.clone(),
                now,
            )?;
            txn.insert_swap_offer(offer.clone())?;
            txn.queue_notification(Notification::new(
                target.owner_id,
                Some(requester_id),
                NotificationKind::SwapOffer,
                format!("New swap offer for \"{}\"", target.name),
                Some(format!("/swaps/offers/{}", offer.id)),
                now,
            ));
            Ok(offer)
        })?;

        tracing::info!(offer = %offer.id, item = %target_item_id, "swap offered");
        Ok(offer)
    }

    /// Drive the offer state machine. On accept, both items (target and,
    /// when present, the offered one) are claimed via compare-and-swap and
    /// every pending sibling offer on the target is rejected, all in one
    /// transaction.
    pub fn update_swap_status(
        &self,
        offer_id: OfferId,
        target: OfferStatus,
        actor_id: UserId,
        reason: Option<String>,
    ) -> ExchangeResult<SwapStatusUpdate> {
        let action = OfferAction::for_target(target)?;
        let now = Utc::now();

        let update = self.store().in_txn(|txn| {
            let mut offer = txn.swap_offer(offer_id)?;
            let role = offer.role_of(actor_id)?;
            let next = offer.transition(action, role)?;
            let previous = offer.status;

            let mut auto_rejected = Vec::new();
            let mut ratings = Vec::new();

            match next {
                OfferStatus::Accepted => {
                    txn.set_item_status(
                        offer.target_item_id,
                        AllocationStatus::Available,
                        AllocationStatus::Swapped,
                    )?;
                    if let Some(offered_id) = offer.offered_item_id {
                        // Also verifies the offered item is still available;
                        // failure rolls the whole accept back.
                        txn.set_item_status(
                            offered_id,
                            AllocationStatus::Available,
                            AllocationStatus::Swapped,
                        )?;
                    }
                    offer.advance(next, None, now);
                    auto_rejected = conflict::reject_sibling_offers(txn, &offer, now)?;
                    txn.queue_notification(Notification::new(
                        offer.requester_id,
                        Some(offer.owner_id),
                        NotificationKind::SwapUpdate,
                        "Your swap offer was accepted",
                        Some(format!("/swaps/offers/{}", offer.id)),
                        now,
                    ));
                }
                OfferStatus::Rejected => {
                    offer.advance(next, reason.clone(), now);
                    txn.queue_notification(Notification::new(
                        offer.requester_id,
                        Some(offer.owner_id),
                        NotificationKind::SwapUpdate,
                        "Your swap offer was rejected",
                        Some(format!("/swaps/offers/{}", offer.id)),
                        now,
                    ));
                }
                OfferStatus::Cancelled => {
                    offer.advance(next, None, now);
                    if previous == OfferStatus::Accepted {
                        release_swap_claim(txn, &offer)?;
                    }
                    let counterpart = if actor_id == offer.owner_id {
                        offer.requester_id
                    } else {
                        offer.owner_id
                    };
                    txn.queue_notification(Notification::new(
                        counterpart,
                        Some(actor_id),
                        NotificationKind::SwapUpdate,
                        "The swap offer was cancelled",
                        Some(format!("/swaps/offers/{}", offer.id)),
                        now,
                    ));
                }
                OfferStatus::Completed => {
                    offer.advance(next, None, now);
                    ratings = swap_rating_hints(txn, &offer);
                    txn.queue_notification(Notification::new(
                        offer.requester_id,
                        Some(offer.owner_id),
                        NotificationKind::SwapUpdate,
                        "Your swap is complete — you can now rate the exchange",
                        Some(format!("/swaps/offers/{}", offer.id)),
                        now,
                    ));
                }
                OfferStatus::Pending => unreachable!("no action targets pending"),
            }

            txn.put_swap_offer(offer.clone())?;
            Ok(SwapStatusUpdate {
                offer,
                auto_rejected,
                ratings,
            })
        })?;

        tracing::info!(
            offer = %offer_id,
            status = %update.offer.status,
            auto_rejected = update.auto_rejected.len(),
            "swap status updated"
        );
        Ok(update)
    }

    pub fn swap_offers_for_user(&self, user: UserId) -> ExchangeResult<Vec<SwapOffer>> {
        self.store().in_txn(|txn| Ok(txn.swap_offers_for_user(user)))
    }
}

/// Undo the allocation made by an accepted-then-cancelled offer, unless
/// another accepted offer has since claimed the target.
fn release_swap_claim(txn: &mut Txn<'_>, cancelled: &SwapOffer) -> ExchangeResult<()> {
    let another_claim = txn
        .swap_offers_for_item(cancelled.target_item_id)
        .iter()
        .any(|o| o.id != cancelled.id && o.status == OfferStatus::Accepted);
    if another_claim {
        return Ok(());
    }

    let target = txn.item(cancelled.target_item_id)?;
    if target.status == AllocationStatus::Swapped {
        txn.set_item_status(
            cancelled.target_item_id,
            AllocationStatus::Swapped,
            AllocationStatus::Available,
        )?;
    }
    if let Some(offered_id) = cancelled.offered_item_id {
        let offered = txn.item(offered_id)?;
        if offered.status == AllocationStatus::Swapped {
            txn.set_item_status(
                offered_id,
                AllocationStatus::Swapped,
                AllocationStatus::Available,
            )?;
        }
    }
    Ok(())
}

fn swap_rating_hints(txn: &Txn<'_>, offer: &SwapOffer) -> Vec<RatingHint> {
    let exchange_id: Uuid = offer.id.into();
    [
        (offer.owner_id, offer.requester_id),
        (offer.requester_id, offer.owner_id),
    ]
    .into_iter()
    .map(|(rater, counterpart)| {
        let key = RatingKey {
            rater_id: rater,
            counterpart_id: counterpart,
            kind: ExchangeKind::Swap,
            exchange_id,
        };
        RatingHint {
            key,
            should_rate: !txn.has_rating(&key),
        }
    })
    .collect()
}
