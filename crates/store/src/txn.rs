//! Transaction handle and store contract.

use std::collections::{BTreeMap, HashMap, VecDeque};

use campustrade_core::{
    ExchangeError, ExchangeResult, ItemId, NotificationId, OfferId, OrderId, RequestId, UserId,
};
use campustrade_items::{AllocationStatus, Item};
use campustrade_notifications::Notification;
use campustrade_orders::Order;
use campustrade_ratings::{Rating, RatingKey};
use campustrade_rentals::RentalRequest;
use campustrade_swaps::SwapOffer;

/// The complete durable state: one typed table per entity, plus the
/// notification outbox.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub(crate) items: HashMap<ItemId, Item>,
    pub(crate) rental_requests: HashMap<RequestId, RentalRequest>,
    pub(crate) swap_offers: HashMap<OfferId, SwapOffer>,
    pub(crate) orders: HashMap<OrderId, Order>,
    /// Uniqueness constraint lives here: the map key IS the constraint.
    pub(crate) ratings: HashMap<RatingKey, Rating>,
    pub(crate) carts: HashMap<UserId, BTreeMap<ItemId, u32>>,
    pub(crate) notifications: Vec<Notification>,
    /// Written in the same transaction as the state change; drained by the
    /// relay outside any transaction.
    pub(crate) outbox: VecDeque<Notification>,
}

/// Store contract consumed by the engine.
///
/// `in_txn` runs `op` against a transaction handle; all mutations commit
/// together on `Ok` and are discarded together on `Err`. Implementations
/// must provide isolation strong enough that the optimistic `from`-status
/// check in [`Txn::set_item_status`] is reliable under concurrent calls.
pub trait ExchangeStore: Send + Sync {
    fn in_txn<T, F>(&self, op: F) -> ExchangeResult<T>
    where
        F: FnOnce(&mut Txn<'_>) -> ExchangeResult<T>;

    /// Hand out everything queued for delivery, removing it from the
    /// outbox. Called by the relay, never inside a transaction.
    fn drain_outbox(&self) -> Vec<Notification>;
}

impl<S> ExchangeStore for std::sync::Arc<S>
where
    S: ExchangeStore + ?Sized,
{
    fn in_txn<T, F>(&self, op: F) -> ExchangeResult<T>
    where
        F: FnOnce(&mut Txn<'_>) -> ExchangeResult<T>,
    {
        (**self).in_txn(op)
    }

    fn drain_outbox(&self) -> Vec<Notification> {
        (**self).drain_outbox()
    }
}

/// Transaction handle over staged state.
#[derive(Debug)]
pub struct Txn<'a> {
    state: &'a mut StoreState,
}

impl<'a> Txn<'a> {
    pub(crate) fn new(state: &'a mut StoreState) -> Self {
        Self { state }
    }

    // ----- items -----

    pub fn insert_item(&mut self, item: Item) -> ExchangeResult<()> {
        if self.state.items.contains_key(&item.id) {
            return Err(ExchangeError::conflict(format!(
                "item {} already exists",
                item.id
            )));
        }
        self.state.items.insert(item.id, item);
        Ok(())
    }

    pub fn item(&self, id: ItemId) -> ExchangeResult<Item> {
        self.state
            .items
            .get(&id)
            .cloned()
            .ok_or_else(|| ExchangeError::not_found(format!("item {id}")))
    }

    /// Optimistic status swap: succeeds only if the item currently holds
    /// `from`. This is the single mutation path for allocation status.
    pub fn set_item_status(
        &mut self,
        id: ItemId,
        from: AllocationStatus,
        to: AllocationStatus,
    ) -> ExchangeResult<()> {
        let item = self
            .state
            .items
            .get_mut(&id)
            .ok_or_else(|| ExchangeError::not_found(format!("item {id}")))?;
        if item.status != from {
            return Err(ExchangeError::conflict(format!(
                "item {id} is {}, expected {from}",
                item.status
            )));
        }
        item.status = to;
        Ok(())
    }

    pub fn items_owned_by(&self, owner: UserId) -> Vec<Item> {
        let mut items: Vec<_> = self
            .state
            .items
            .values()
            .filter(|i| i.owner_id == owner)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.id);
        items
    }

    // ----- rental requests -----

    pub fn insert_rental_request(&mut self, request: RentalRequest) -> ExchangeResult<()> {
        if self.state.rental_requests.contains_key(&request.id) {
            return Err(ExchangeError::conflict(format!(
                "rental request {} already exists",
                request.id
            )));
        }
        self.state.rental_requests.insert(request.id, request);
        Ok(())
    }

    pub fn rental_request(&self, id: RequestId) -> ExchangeResult<RentalRequest> {
        self.state
            .rental_requests
            .get(&id)
            .cloned()
            .ok_or_else(|| ExchangeError::not_found(format!("rental request {id}")))
    }

    pub fn put_rental_request(&mut self, request: RentalRequest) -> ExchangeResult<()> {
        if !self.state.rental_requests.contains_key(&request.id) {
            return Err(ExchangeError::not_found(format!(
                "rental request {}",
                request.id
            )));
        }
        self.state.rental_requests.insert(request.id, request);
        Ok(())
    }

    pub fn rental_requests_for_item(&self, item_id: ItemId) -> Vec<RentalRequest> {
        let mut requests: Vec<_> = self
            .state
            .rental_requests
            .values()
            .filter(|r| r.item_id == item_id)
            .cloned()
            .collect();
        requests.sort_by_key(|r| r.id);
        requests
    }

    pub fn rental_requests_for_user(&self, user: UserId) -> Vec<RentalRequest> {
        let mut requests: Vec<_> = self
            .state
            .rental_requests
            .values()
            .filter(|r| r.requester_id == user || r.owner_id == user)
            .cloned()
            .collect();
        requests.sort_by_key(|r| r.id);
        requests
    }

    // ----- swap offers -----

    pub fn insert_swap_offer(&mut self, offer: SwapOffer) -> ExchangeResult<()> {
        if self.state.swap_offers.contains_key(&offer.id) {
            return Err(ExchangeError::conflict(format!(
                "swap offer {} already exists",
                offer.id
            )));
        }
        self.state.swap_offers.insert(offer.id, offer);
        Ok(())
    }

    pub fn swap_offer(&self, id: OfferId) -> ExchangeResult<SwapOffer> {
        self.state
            .swap_offers
            .get(&id)
            .cloned()
            .ok_or_else(|| ExchangeError::not_found(format!("swap offer {id}")))
    }

    pub fn put_swap_offer(&mut self, offer: SwapOffer) -> ExchangeResult<()> {
        if !self.state.swap_offers.contains_key(&offer.id) {
            return Err(ExchangeError::not_found(format!("swap offer {}", offer.id)));
        }
        self.state.swap_offers.insert(offer.id, offer);
        Ok(())
    }

    pub fn swap_offers_for_item(&self, item_id: ItemId) -> Vec<SwapOffer> {
        let mut offers: Vec<_> = self
            .state
            .swap_offers
            .values()
            .filter(|o| o.target_item_id == item_id)
            .cloned()
            .collect();
        offers.sort_by_key(|o| o.id);
        offers
    }

    pub fn swap_offers_for_user(&self, user: UserId) -> Vec<SwapOffer> {
        let mut offers: Vec<_> = self
            .state
            .swap_offers
            .values()
            .filter(|o| o.requester_id == user || o.owner_id == user)
            .cloned()
            .collect();
        offers.sort_by_key(|o| o.id);
        offers
    }

    // ----- orders -----

    pub fn insert_order(&mut self, order: Order) -> ExchangeResult<()> {
        if self.state.orders.contains_key(&order.id) {
            return Err(ExchangeError::conflict(format!(
                "order {} already exists",
                order.id
            )));
        }
        self.state.orders.insert(order.id, order);
        Ok(())
    }

    pub fn order(&self, id: OrderId) -> ExchangeResult<Order> {
        self.state
            .orders
            .get(&id)
            .cloned()
            .ok_or_else(|| ExchangeError::not_found(format!("order {id}")))
    }

    pub fn put_order(&mut self, order: Order) -> ExchangeResult<()> {
        if !self.state.orders.contains_key(&order.id) {
            return Err(ExchangeError::not_found(format!("order {}", order.id)));
        }
        self.state.orders.insert(order.id, order);
        Ok(())
    }

    pub fn orders_for_user(&self, user: UserId) -> Vec<Order> {
        let mut orders: Vec<_> = self
            .state
            .orders
            .values()
            .filter(|o| o.buyer_id == user || o.lines.iter().any(|l| l.seller_id == user))
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.id);
        orders
    }

    // ----- ratings -----

    /// Insert honoring the uniqueness constraint on `RatingKey`. This is
    /// the final arbiter against racing submissions.
    pub fn insert_rating(&mut self, rating: Rating) -> ExchangeResult<()> {
        if self.state.ratings.contains_key(&rating.key) {
            return Err(ExchangeError::DuplicateRating);
        }
        self.state.ratings.insert(rating.key, rating);
        Ok(())
    }

    pub fn has_rating(&self, key: &RatingKey) -> bool {
        self.state.ratings.contains_key(key)
    }

    pub fn ratings_about(&self, counterpart: UserId) -> Vec<Rating> {
        let mut ratings: Vec<_> = self
            .state
            .ratings
            .values()
            .filter(|r| r.key.counterpart_id == counterpart)
            .cloned()
            .collect();
        ratings.sort_by_key(|r| r.created_at);
        ratings
    }

    // ----- carts -----

    pub fn add_cart_item(&mut self, user: UserId, item_id: ItemId, quantity: u32) {
        *self
            .state
            .carts
            .entry(user)
            .or_default()
            .entry(item_id)
            .or_insert(0) += quantity;
    }

    pub fn cart_items(&self, user: UserId) -> Vec<(ItemId, u32)> {
        self.state
            .carts
            .get(&user)
            .map(|c| c.iter().map(|(id, qty)| (*id, *qty)).collect())
            .unwrap_or_default()
    }

    /// Cart Store collaborator: drop purchased items from the buyer's cart.
    pub fn remove_cart_items(&mut self, user: UserId, item_ids: &[ItemId]) {
        if let Some(cart) = self.state.carts.get_mut(&user) {
            for id in item_ids {
                cart.remove(id);
            }
        }
    }

    // ----- notifications / outbox -----

    /// Append the row and queue it for delivery; both are part of the
    /// enclosing transaction.
    pub fn queue_notification(&mut self, notification: Notification) {
        self.state.outbox.push_back(notification.clone());
        self.state.notifications.push(notification);
    }

    pub fn notifications_for(&self, recipient: UserId) -> Vec<Notification> {
        self.state
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient)
            .cloned()
            .collect()
    }

    pub fn mark_notification_read(
        &mut self,
        id: NotificationId,
        recipient: UserId,
    ) -> ExchangeResult<Notification> {
        let n = self
            .state
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| ExchangeError::not_found(format!("notification {id}")))?;
        if n.recipient_id != recipient {
            return Err(ExchangeError::forbidden(
                "notification belongs to another user",
            ));
        }
        n.is_read = true;
        Ok(n.clone())
    }
}
