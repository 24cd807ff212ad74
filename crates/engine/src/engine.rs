//! Engine handle + item-ledger operations.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use campustrade_core::{ExchangeError, ExchangeResult, ItemId, OfferId, RequestId, UserId};
use campustrade_items::{AllocationStatus, Item, ListingKind};
use campustrade_notifications::{Notification, NotificationKind};
use campustrade_rentals::{RentalRequest, RequestStatus};
use campustrade_store::ExchangeStore;
use campustrade_swaps::{OfferStatus, SwapOffer};

/// The lifecycle engine. Holds the injected store handle; no process-wide
/// state of its own. Constructed once at service start and shared.
#[derive(Debug)]
pub struct ExchangeEngine<S> {
    store: S,
}

impl<S> ExchangeEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Result of archiving an item: which pending exchanges it swept away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemArchival {
    pub item: Item,
    pub declined_requests: Vec<RequestId>,
    pub rejected_offers: Vec<OfferId>,
}

impl<S: ExchangeStore> ExchangeEngine<S> {
    /// Create a listing. The item enters the ledger as `available`.
    pub fn list_item(
        &self,
        owner_id: UserId,
        name: impl Into<String>,
        kind: ListingKind,
        price: Option<u64>,
    ) -> ExchangeResult<Item> {
        let item = Item::new_listing(ItemId::new(), owner_id, name, kind, price, Utc::now())?;
        self.store.in_txn(|txn| {
            txn.insert_item(item.clone())?;
            Ok(())
        })?;
        tracing::info!(item = %item.id, owner = %owner_id, kind = %kind, "item listed");
        Ok(item)
    }

    pub fn item(&self, id: ItemId) -> ExchangeResult<Item> {
        self.store.in_txn(|txn| txn.item(id))
    }

    pub fn items_owned_by(&self, owner: UserId) -> ExchangeResult<Vec<Item>> {
        self.store.in_txn(|txn| Ok(txn.items_owned_by(owner)))
    }

    /// Soft-delete a listing. Items with exchange history are archived, not
    /// removed; pending requests/offers against it are swept to their
    /// terminal rejection states in the same transaction.
    pub fn archive_item(&self, item_id: ItemId, actor_id: UserId) -> ExchangeResult<ItemArchival> {
        let now = Utc::now();
        let archival = self.store.in_txn(|txn| {
            let item = txn.item(item_id)?;
            if !item.is_owned_by(actor_id) {
                return Err(ExchangeError::forbidden("only the owner may archive an item"));
            }
            if item.status != AllocationStatus::Available {
                return Err(ExchangeError::conflict(format!(
                    "cannot archive an item that is {}",
                    item.status
                )));
            }

            txn.set_item_status(item_id, AllocationStatus::Available, AllocationStatus::Archived)?;

            let mut declined_requests = Vec::new();
            for req in txn.rental_requests_for_item(item_id) {
                if !req.is_pending() {
                    continue;
                }
                let mut req: RentalRequest = req;
                req.advance(
                    RequestStatus::Declined,
                    Some("Item is no longer listed".to_string()),
                    now,
                );
                txn.queue_notification(Notification::new(
                    req.requester_id,
                    Some(actor_id),
                    NotificationKind::RentalUpdate,
                    "Your rental request was declined: the item is no longer listed",
                    Some(format!("/rentals/requests/{}", req.id)),
                    now,
                ));
                declined_requests.push(req.id);
                txn.put_rental_request(req)?;
            }

            let mut rejected_offers = Vec::new();
            for offer in txn.swap_offers_for_item(item_id) {
                if !offer.is_pending() {
                    continue;
                }
                let mut offer: SwapOffer = offer;
                offer.advance(
                    OfferStatus::Rejected,
                    Some("Item is no longer listed".to_string()),
                    now,
                );
                txn.queue_notification(Notification::new(
                    offer.requester_id,
                    Some(actor_id),
                    NotificationKind::SwapUpdate,
                    "Your swap offer was rejected: the item is no longer listed",
                    Some(format!("/swaps/offers/{}", offer.id)),
                    now,
                ));
                rejected_offers.push(offer.id);
                txn.put_swap_offer(offer)?;
            }

            let item = txn.item(item_id)?;
            Ok(ItemArchival {
                item,
                declined_requests,
                rejected_offers,
            })
        })?;

        tracing::info!(
            item = %item_id,
            declined = archival.declined_requests.len(),
            rejected = archival.rejected_offers.len(),
            "item archived"
        );
        Ok(archival)
    }

    pub fn notifications_for_user(&self, user: UserId) -> ExchangeResult<Vec<Notification>> {
        self.store.in_txn(|txn| Ok(txn.notifications_for(user)))
    }

    /// Mark one of the actor's own notifications as read.
    pub fn mark_notification_read(
        &self,
        id: campustrade_core::NotificationId,
        actor_id: UserId,
    ) -> ExchangeResult<Notification> {
        self.store.in_txn(|txn| txn.mark_notification_read(id, actor_id))
    }
}
