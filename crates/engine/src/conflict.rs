//! Conflict Resolver: sibling invalidation shared by rentals and swaps.
//!
//! Runs inside the same transaction as the accept it belongs to; a racing
//! accept on a sibling therefore cannot also succeed — one of the two
//! loses the item-status compare-and-swap.

use chrono::{DateTime, Utc};

use campustrade_core::{ExchangeResult, OfferId, RequestId};
use campustrade_notifications::{Notification, NotificationKind};
use campustrade_rentals::{RentalRequest, RequestStatus};
use campustrade_store::Txn;
use campustrade_swaps::{OfferStatus, SwapOffer};

/// Comment stamped onto rental requests that lose to an accepted sibling.
pub const RENTAL_AUTO_DECLINE_COMMENT: &str = "Item dates booked";

/// Reason stamped onto swap offers that lose to an accepted sibling.
pub const SWAP_AUTO_REJECT_REASON: &str = "Item has been swapped with another offer.";

/// Two rental requests conflict iff they target the same item, both are
/// non-terminal, and their date windows intersect.
pub fn rentals_conflict(a: &RentalRequest, b: &RentalRequest) -> bool {
    a.item_id == b.item_id
        && matches!(a.status, RequestStatus::Pending | RequestStatus::Accepted)
        && matches!(b.status, RequestStatus::Pending | RequestStatus::Accepted)
        && a.window.overlaps(&b.window)
}

/// Decline every other pending request on the accepted request's item whose
/// window overlaps, notifying each losing requester.
pub fn decline_overlapping_rentals(
    txn: &mut Txn<'_>,
    accepted: &RentalRequest,
    now: DateTime<Utc>,
) -> ExchangeResult<Vec<RequestId>> {
    let mut declined = Vec::new();
    for sibling in txn.rental_requests_for_item(accepted.item_id) {
        if sibling.id == accepted.id || !sibling.is_pending() {
            continue;
        }
        if !sibling.window.overlaps(&accepted.window) {
            continue;
        }

        let mut sibling = sibling;
        sibling.advance(
            RequestStatus::Declined,
            Some(RENTAL_AUTO_DECLINE_COMMENT.to_string()),
            now,
        );
        txn.queue_notification(Notification::new(
            sibling.requester_id,
            Some(accepted.owner_id),
            NotificationKind::RentalUpdate,
            format!("Your rental request was declined: {RENTAL_AUTO_DECLINE_COMMENT}"),
            Some(format!("/rentals/requests/{}", sibling.id)),
            now,
        ));
        declined.push(sibling.id);
        txn.put_rental_request(sibling)?;
    }
    Ok(declined)
}

/// Reject every other pending offer on the accepted offer's target item,
/// notifying each losing requester. Swaps carry no date dimension: once
/// one offer wins, every sibling loses.
pub fn reject_sibling_offers(
    txn: &mut Txn<'_>,
    accepted: &SwapOffer,
    now: DateTime<Utc>,
) -> ExchangeResult<Vec<OfferId>> {
    let mut rejected = Vec::new();
    for sibling in txn.swap_offers_for_item(accepted.target_item_id) {
        if sibling.id == accepted.id || !sibling.is_pending() {
            continue;
        }

        let mut sibling = sibling;
        sibling.advance(
            OfferStatus::Rejected,
            Some(SWAP_AUTO_REJECT_REASON.to_string()),
            now,
        );
        txn.queue_notification(Notification::new(
            sibling.requester_id,
            Some(accepted.owner_id),
            NotificationKind::SwapUpdate,
            format!("Your swap offer was rejected: {SWAP_AUTO_REJECT_REASON}"),
            Some(format!("/swaps/offers/{}", sibling.id)),
            now,
        ));
        rejected.push(sibling.id);
        txn.put_swap_offer(sibling)?;
    }
    Ok(rejected)
}
