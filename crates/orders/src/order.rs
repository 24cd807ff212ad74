use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use campustrade_core::{Entity, ExchangeError, ExchangeResult, ItemId, OrderId, UserId};

/// Sale order status lifecycle. Cancelled/completed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Cancelled,
    Completed,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Completed)
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Order line: item, seller, quantity, price at sale time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: ItemId,
    pub seller_id: UserId,
    pub quantity: u32,
    /// Unit price in smallest currency unit, snapshotted at checkout.
    pub unit_price: u64,
}

impl OrderLine {
    pub fn subtotal(&self) -> u64 {
        self.unit_price * u64::from(self.quantity)
    }
}

/// Meetup metadata carried opaquely on the order; the engine never
/// interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MeetupDetails {
    pub payment_method: Option<String>,
    pub details: Option<serde_json::Value>,
}

/// A multi-item sale transaction owned by the Order Engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: UserId,
    pub lines: Vec<OrderLine>,
    pub status: OrderStatus,
    pub meetup: MeetupDetails,
    /// Why the order was cancelled, when it was.
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new_pending(
        id: OrderId,
        buyer_id: UserId,
        lines: Vec<OrderLine>,
        meetup: MeetupDetails,
        created_at: DateTime<Utc>,
    ) -> ExchangeResult<Self> {
        if lines.is_empty() {
            return Err(ExchangeError::validation("order has no lines"));
        }
        if lines.iter().any(|l| l.quantity == 0) {
            return Err(ExchangeError::validation("line quantity must be positive"));
        }
        // Price arithmetic is validated once here; `subtotal`/`total` on a
        // constructed order cannot overflow.
        let mut total: u64 = 0;
        for line in &lines {
            let subtotal = line
                .unit_price
                .checked_mul(u64::from(line.quantity))
                .ok_or_else(|| ExchangeError::validation("line subtotal overflows"))?;
            total = total
                .checked_add(subtotal)
                .ok_or_else(|| ExchangeError::validation("order total overflows"))?;
        }
        Ok(Self {
            id,
            buyer_id,
            lines,
            status: OrderStatus::Pending,
            meetup,
            cancel_reason: None,
            created_at,
            updated_at: created_at,
        })
    }

    /// Σ(unit price × quantity) over the snapshotted lines.
    pub fn total(&self) -> u64 {
        self.lines.iter().map(OrderLine::subtotal).sum()
    }

    /// Items referenced by this order (one entry per line).
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.lines.iter().map(|l| l.item_id).collect()
    }

    /// Distinct sellers, preserving first-seen order. Used so a seller with
    /// several lines is notified (and rated) once.
    pub fn distinct_sellers(&self) -> Vec<UserId> {
        let mut sellers = Vec::new();
        for line in &self.lines {
            if !sellers.contains(&line.seller_id) {
                sellers.push(line.seller_id);
            }
        }
        sellers
    }

    fn ensure_pending(&self, action: &str) -> ExchangeResult<()> {
        if self.status != OrderStatus::Pending {
            return Err(ExchangeError::invalid_transition(format!(
                "cannot {action} a {} order",
                self.status
            )));
        }
        Ok(())
    }

    /// Validate the cancel edge; caller applies it in a transaction.
    pub fn transition_cancelled(&self) -> ExchangeResult<OrderStatus> {
        self.ensure_pending("cancel")?;
        Ok(OrderStatus::Cancelled)
    }

    /// Validate the complete edge; caller applies it in a transaction.
    pub fn transition_completed(&self) -> ExchangeResult<OrderStatus> {
        self.ensure_pending("complete")?;
        Ok(OrderStatus::Completed)
    }

    pub fn advance(&mut self, next: OrderStatus, reason: Option<String>, at: DateTime<Utc>) {
        self.status = next;
        if next == OrderStatus::Cancelled {
            self.cancel_reason = reason;
        }
        self.updated_at = at;
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(seller: UserId, unit_price: u64, quantity: u32) -> OrderLine {
        OrderLine {
            item_id: ItemId::new(),
            seller_id: seller,
            quantity,
            unit_price,
        }
    }

    fn order_with(lines: Vec<OrderLine>) -> ExchangeResult<Order> {
        Order::new_pending(
            OrderId::new(),
            UserId::new(),
            lines,
            MeetupDetails::default(),
            Utc::now(),
        )
    }

    #[test]
    fn empty_orders_are_rejected() {
        let err = order_with(vec![]).unwrap_err();
        assert!(matches!(err, ExchangeError::Validation(_)));
    }

    #[test]
    fn zero_quantity_lines_are_rejected() {
        let err = order_with(vec![line(UserId::new(), 100, 0)]).unwrap_err();
        assert!(matches!(err, ExchangeError::Validation(_)));
    }

    #[test]
    fn overflowing_price_arithmetic_is_rejected() {
        let err = order_with(vec![line(UserId::new(), u64::MAX, 2)]).unwrap_err();
        assert!(matches!(err, ExchangeError::Validation(_)));

        // Per-line subtotals fit but their sum does not.
        let err = order_with(vec![
            line(UserId::new(), u64::MAX, 1),
            line(UserId::new(), 1, 1),
        ])
        .unwrap_err();
        assert!(matches!(err, ExchangeError::Validation(_)));
    }

    #[test]
    fn total_sums_snapshotted_lines() {
        let order = order_with(vec![
            line(UserId::new(), 1_000, 2),
            line(UserId::new(), 250, 1),
        ])
        .unwrap();
        assert_eq!(order.total(), 2_250);
    }

    #[test]
    fn distinct_sellers_dedupes_but_keeps_order() {
        let a = UserId::new();
        let b = UserId::new();
        let order = order_with(vec![line(a, 100, 1), line(b, 100, 1), line(a, 200, 1)]).unwrap();
        assert_eq!(order.distinct_sellers(), vec![a, b]);
    }

    #[test]
    fn terminal_orders_refuse_further_transitions() {
        let mut order = order_with(vec![line(UserId::new(), 100, 1)]).unwrap();
        order.advance(OrderStatus::Cancelled, Some("changed my mind".into()), Utc::now());

        assert!(matches!(
            order.transition_completed().unwrap_err(),
            ExchangeError::InvalidTransition(_)
        ));
        assert!(matches!(
            order.transition_cancelled().unwrap_err(),
            ExchangeError::InvalidTransition(_)
        ));
        assert_eq!(order.cancel_reason.as_deref(), Some("changed my mind"));
    }
}
