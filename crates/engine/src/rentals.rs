//! Rental lifecycle operations.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use campustrade_core::{ExchangeError, ExchangeResult, RequestId, UserId};
use campustrade_items::{AllocationStatus, ListingKind};
use campustrade_notifications::{Notification, NotificationKind};
use campustrade_ratings::{ExchangeKind, RatingHint, RatingKey};
use campustrade_rentals::{DateRange, RentalRequest, RequestAction, RequestStatus};
use campustrade_store::{ExchangeStore, Txn};

use crate::conflict;
use crate::engine::ExchangeEngine;

/// Outcome of a rental status change: the updated request, any siblings
/// auto-declined alongside an accept, and rating hints on completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalStatusUpdate {
    pub request: RentalRequest,
    pub auto_declined: Vec<RequestId>,
    pub ratings: Vec<RatingHint>,
}

impl<S: ExchangeStore> ExchangeEngine<S> {
    /// Create a pending rental request and notify the item's owner.
    pub fn request_rental(
        &self,
        item_id: campustrade_core::ItemId,
        requester_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
        comment: Option<String>,
    ) -> ExchangeResult<RentalRequest> {
        let window = DateRange::new(start, end)?;
        let now = Utc::now();

        let request = self.store().in_txn(|txn| {
            let item = txn.item(item_id)?;
            item.ensure_kind(ListingKind::Rental)?;
            if item.status == AllocationStatus::Archived {
                return Err(ExchangeError::validation("item is no longer listed"));
            }

            let request = RentalRequest::new_pending(
                RequestId::new(),
                item_id,
                requester_id,
                item.owner_id,
                window,
                comment.clone(),
                now,
            )?;
            txn.insert_rental_request(request.clone())?;
            txn.queue_notification(Notification::new(
                item.owner_id,
                Some(requester_id),
                NotificationKind::RentalRequest,
                format!("New rental request for \"{}\" ({window})", item.name),
                Some(format!("/rentals/requests/{}", request.id)),
                now,
            ));
            Ok(request)
        })?;

        tracing::info!(request = %request.id, item = %item_id, "rental requested");
        Ok(request)
    }

    /// Drive the request state machine. On accept, the Conflict Resolver
    /// runs in the same transaction: the item is claimed via
    /// compare-and-swap and every overlapping pending sibling is declined.
    pub fn update_rental_status(
        &self,
        request_id: RequestId,
        target: RequestStatus,
        actor_id: UserId,
        reason: Option<String>,
    ) -> ExchangeResult<RentalStatusUpdate> {
        let action = RequestAction::for_target(target)?;
        let now = Utc::now();

        let update = self.store().in_txn(|txn| {
            let mut request = txn.rental_request(request_id)?;
            let role = request.role_of(actor_id)?;
            let next = request.transition(action, role)?;
            let previous = request.status;

            let mut auto_declined = Vec::new();
            let mut ratings = Vec::new();

            match next {
                RequestStatus::Accepted => {
                    let item = txn.item(request.item_id)?;
                    item.ensure_kind(ListingKind::Rental)?;
                    // Claims the item; a racing accept on a sibling loses here.
                    txn.set_item_status(
                        request.item_id,
                        AllocationStatus::Available,
                        AllocationStatus::Rented,
                    )?;
                    request.advance(next, None, now);
                    auto_declined = conflict::decline_overlapping_rentals(txn, &request, now)?;
                    txn.queue_notification(Notification::new(
                        request.requester_id,
                        Some(request.owner_id),
                        NotificationKind::RentalUpdate,
                        "Your rental request was accepted",
                        Some(format!("/rentals/requests/{}", request.id)),
                        now,
                    ));
                }
                RequestStatus::Declined => {
                    request.advance(next, reason.clone(), now);
                    txn.queue_notification(Notification::new(
                        request.requester_id,
                        Some(request.owner_id),
                        NotificationKind::RentalUpdate,
                        "Your rental request was declined",
                        Some(format!("/rentals/requests/{}", request.id)),
                        now,
                    ));
                }
                RequestStatus::Cancelled => {
                    request.advance(next, reason.clone(), now);
                    if previous == RequestStatus::Accepted {
                        release_rental_claim(txn, &request)?;
                    }
                    let counterpart = if actor_id == request.owner_id {
                        request.requester_id
                    } else {
                        request.owner_id
                    };
                    txn.queue_notification(Notification::new(
                        counterpart,
                        Some(actor_id),
                        NotificationKind::RentalUpdate,
                        "The rental request was cancelled",
                        Some(format!("/rentals/requests/{}", request.id)),
                        now,
                    ));
                }
                RequestStatus::Completed => {
                    // The item returns to its owner.
                    txn.set_item_status(
                        request.item_id,
                        AllocationStatus::Rented,
                        AllocationStatus::Available,
                    )?;
                    request.advance(next, None, now);
                    ratings = rental_rating_hints(txn, &request);
                    txn.queue_notification(Notification::new(
                        request.requester_id,
                        Some(request.owner_id),
                        NotificationKind::RentalUpdate,
                        "Your rental is complete — you can now rate the exchange",
                        Some(format!("/rentals/requests/{}", request.id)),
                        now,
                    ));
                }
                RequestStatus::Pending => unreachable!("no action targets pending"),
            }

            txn.put_rental_request(request.clone())?;
            Ok(RentalStatusUpdate {
                request,
                auto_declined,
                ratings,
            })
        })?;

        tracing::info!(
            request = %request_id,
            status = %update.request.status,
            auto_declined = update.auto_declined.len(),
            "rental status updated"
        );
        Ok(update)
    }

    pub fn rental_requests_for_user(&self, user: UserId) -> ExchangeResult<Vec<RentalRequest>> {
        self.store().in_txn(|txn| Ok(txn.rental_requests_for_user(user)))
    }
}

/// Revert the item to `available` after an accepted request is cancelled —
/// unless another accepted request currently claims it (the item may have
/// been re-allocated in between).
fn release_rental_claim(txn: &mut Txn<'_>, cancelled: &RentalRequest) -> ExchangeResult<()> {
    let another_claim = txn
        .rental_requests_for_item(cancelled.item_id)
        .iter()
        .any(|r| r.id != cancelled.id && r.status == RequestStatus::Accepted);
    if another_claim {
        return Ok(());
    }

    let item = txn.item(cancelled.item_id)?;
    if item.status == AllocationStatus::Rented {
        txn.set_item_status(
            cancelled.item_id,
            AllocationStatus::Rented,
            AllocationStatus::Available,
        )?;
    }
    Ok(())
}

/// One hint per party: each side of a completed rental may rate the other
/// exactly once.
fn rental_rating_hints(txn: &Txn<'_>, request: &RentalRequest) -> Vec<RatingHint> {
    let exchange_id: Uuid = request.id.into();
    [
        (request.owner_id, request.requester_id),
        (request.requester_id, request.owner_id),
    ]
    .into_iter()
    .map(|(rater, counterpart)| {
        let key = RatingKey {
            rater_id: rater,
            counterpart_id: counterpart,
            kind: ExchangeKind::Rental,
            exchange_id,
        };
        RatingHint {
            key,
            should_rate: !txn.has_rating(&key),
        }
    })
    .collect()
}
