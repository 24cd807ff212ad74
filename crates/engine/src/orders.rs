//! Order Engine: checkout and order lifecycle.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use campustrade_core::{ExchangeError, ExchangeResult, ItemId, OrderId, UserId};
use campustrade_items::{AllocationStatus, ListingKind};
use campustrade_notifications::{Notification, NotificationKind};
use campustrade_orders::{MeetupDetails, Order, OrderLine, OrderStatus};
use campustrade_ratings::{ExchangeKind, RatingHint, RatingKey};
use campustrade_store::ExchangeStore;

use crate::engine::ExchangeEngine;

/// One requested purchase: the item plus how many. Price is NOT taken from
/// the client — it is re-read from the listing at execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub item_id: ItemId,
    pub quantity: u32,
}

/// Outcome of cancelling an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancellation {
    pub order: Order,
    pub released_items: Vec<ItemId>,
}

/// Outcome of completing an order: rating hints, one per distinct seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCompletion {
    pub order: Order,
    pub ratings: Vec<RatingHint>,
}

impl<S: ExchangeStore> ExchangeEngine<S> {
    /// All-or-nothing checkout. Every line's price and availability is
    /// re-read inside the transaction; any unavailable item fails the
    /// whole checkout (naming the item) with no partial commit. On
    /// success all referenced items flip to `reserved_for_sale`, the
    /// buyer's cart is pruned, and each seller is notified per item.
    pub fn checkout(
        &self,
        buyer_id: UserId,
        lines: Vec<CheckoutLine>,
        meetup: MeetupDetails,
    ) -> ExchangeResult<Order> {
        if lines.is_empty() {
            return Err(ExchangeError::validation("checkout has no lines"));
        }
        for (idx, line) in lines.iter().enumerate() {
            if line.quantity == 0 {
                return Err(ExchangeError::validation(format!(
                    "line {idx} has zero quantity"
                )));
            }
            if lines[..idx].iter().any(|l| l.item_id == line.item_id) {
                return Err(ExchangeError::validation(format!(
                    "item {} appears on more than one line",
                    line.item_id
                )));
            }
        }

        let now = Utc::now();
        let order = self.store().in_txn(|txn| {
            let mut order_lines = Vec::with_capacity(lines.len());
            for line in &lines {
                let item = txn.item(line.item_id)?;
                item.ensure_kind(ListingKind::Sale)?;
                if item.is_owned_by(buyer_id) {
                    return Err(ExchangeError::validation(format!(
                        "cannot buy your own item {}",
                        item.id
                    )));
                }
                if !item.status.is_available() {
                    return Err(ExchangeError::item_unavailable(format!(
                        "item {} is {}",
                        item.id, item.status
                    )));
                }
                order_lines.push(OrderLine {
                    item_id: item.id,
                    seller_id: item.owner_id,
                    quantity: line.quantity,
                    unit_price: item.sale_price()?,
                });
            }

            let order = Order::new_pending(OrderId::new(), buyer_id, order_lines, meetup.clone(), now)?;
            txn.insert_order(order.clone())?;

            for order_line in &order.lines {
                txn.set_item_status(
                    order_line.item_id,
                    AllocationStatus::Available,
                    AllocationStatus::ReservedForSale,
                )?;
                let item = txn.item(order_line.item_id)?;
                txn.queue_notification(Notification::new(
                    order_line.seller_id,
                    Some(buyer_id),
                    NotificationKind::Order,
                    format!("\"{}\" was purchased and is reserved for meetup", item.name),
                    Some(format!("/orders/{}", order.id)),
                    now,
                ));
            }

            txn.remove_cart_items(buyer_id, &order.item_ids());
            Ok(order)
        })?;

        tracing::info!(
            order = %order.id,
            buyer = %buyer_id,
            lines = order.lines.len(),
            total = order.total(),
            "checkout committed"
        );
        Ok(order)
    }

    /// Cancel a pending order: every referenced item returns to
    /// `available` and each distinct seller is notified.
    pub fn cancel_order(
        &self,
        order_id: OrderId,
        actor_id: UserId,
        reason: Option<String>,
    ) -> ExchangeResult<OrderCancellation> {
        let now = Utc::now();
        let cancellation = self.store().in_txn(|txn| {
            let mut order = txn.order(order_id)?;
            ensure_party(&order, actor_id)?;
            let next = order.transition_cancelled()?;
            order.advance(next, reason.clone(), now);

            let released_items = order.item_ids();
            for item_id in &released_items {
                txn.set_item_status(
                    *item_id,
                    AllocationStatus::ReservedForSale,
                    AllocationStatus::Available,
                )?;
            }

            for seller in order.distinct_sellers() {
                if seller != actor_id {
                    txn.queue_notification(Notification::new(
                        seller,
                        Some(actor_id),
                        NotificationKind::OrderUpdate,
                        "An order for your item was cancelled",
                        Some(format!("/orders/{}", order.id)),
                        now,
                    ));
                }
            }
            if order.buyer_id != actor_id {
                txn.queue_notification(Notification::new(
                    order.buyer_id,
                    Some(actor_id),
                    NotificationKind::OrderUpdate,
                    "Your order was cancelled",
                    Some(format!("/orders/{}", order.id)),
                    now,
                ));
            }

            txn.put_order(order.clone())?;
            Ok(OrderCancellation {
                order,
                released_items,
            })
        })?;

        tracing::info!(order = %order_id, "order cancelled");
        Ok(cancellation)
    }

    /// Complete a pending order. Sold items are archived (they keep their
    /// exchange history but leave circulation) and the Rating Gate is
    /// evaluated for the buyer against each distinct seller — one
    /// potential rating per seller even when several lines share one.
    pub fn complete_order(&self, order_id: OrderId, actor_id: UserId) -> ExchangeResult<OrderCompletion> {
        let now = Utc::now();
        let completion = self.store().in_txn(|txn| {
            let mut order = txn.order(order_id)?;
            ensure_party(&order, actor_id)?;
            let next = order.transition_completed()?;
            order.advance(next, None, now);

            for item_id in order.item_ids() {
                txn.set_item_status(
                    item_id,
                    AllocationStatus::ReservedForSale,
                    AllocationStatus::Archived,
                )?;
            }

            let exchange_id: Uuid = order.id.into();
            let ratings: Vec<RatingHint> = order
                .distinct_sellers()
                .into_iter()
                .map(|seller| {
                    let key = RatingKey {
                        rater_id: order.buyer_id,
                        counterpart_id: seller,
                        kind: ExchangeKind::Sale,
                        exchange_id,
                    };
                    RatingHint {
                        key,
                        should_rate: !txn.has_rating(&key),
                    }
                })
                .collect();

            for seller in order.distinct_sellers() {
                if seller != actor_id {
                    txn.queue_notification(Notification::new(
                        seller,
                        Some(actor_id),
                        NotificationKind::OrderUpdate,
                        "An order for your item was completed",
                        Some(format!("/orders/{}", order.id)),
                        now,
                    ));
                }
            }

            txn.put_order(order.clone())?;
            Ok(OrderCompletion { order, ratings })
        })?;

        tracing::info!(order = %order_id, "order completed");
        Ok(completion)
    }

    pub fn order(&self, id: OrderId) -> ExchangeResult<Order> {
        self.store().in_txn(|txn| txn.order(id))
    }

    /// Add a sale listing to the user's cart. The cart is advisory — the
    /// items are only claimed at checkout — so availability is not checked
    /// here beyond the listing being a sale and not the user's own.
    pub fn add_to_cart(
        &self,
        user_id: UserId,
        item_id: ItemId,
        quantity: u32,
    ) -> ExchangeResult<()> {
        if quantity == 0 {
            return Err(ExchangeError::validation("quantity must be positive"));
        }
        self.store().in_txn(|txn| {
            let item = txn.item(item_id)?;
            item.ensure_kind(ListingKind::Sale)?;
            if item.is_owned_by(user_id) {
                return Err(ExchangeError::validation("cannot add your own item to the cart"));
            }
            txn.add_cart_item(user_id, item_id, quantity);
            Ok(())
        })
    }

    pub fn cart_for_user(&self, user_id: UserId) -> ExchangeResult<Vec<(ItemId, u32)>> {
        self.store().in_txn(|txn| Ok(txn.cart_items(user_id)))
    }

    pub fn orders_for_user(&self, user: UserId) -> ExchangeResult<Vec<Order>> {
        self.store().in_txn(|txn| Ok(txn.orders_for_user(user)))
    }
}

fn ensure_party(order: &Order, actor_id: UserId) -> ExchangeResult<()> {
    if order.buyer_id == actor_id || order.lines.iter().any(|l| l.seller_id == actor_id) {
        return Ok(());
    }
    Err(ExchangeError::forbidden("actor is not a party to this order"))
}
