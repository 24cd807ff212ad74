use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use campustrade_core::{Entity, ExchangeError, ExchangeResult, ItemId, UserId};

/// How the item is listed: what kind of exchange it participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Sale,
    Rental,
    Swap,
}

impl core::fmt::Display for ListingKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            ListingKind::Sale => "sale",
            ListingKind::Rental => "rental",
            ListingKind::Swap => "swap",
        };
        f.write_str(s)
    }
}

/// The item's current exclusivity state.
///
/// Exactly one status at any instant; transitions happen only through the
/// store's `set_item_status(from, to)` compare-and-swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStatus {
    Available,
    ReservedForSale,
    Rented,
    Swapped,
    Archived,
}

impl AllocationStatus {
    /// Whether the item can still be claimed by a new exchange.
    pub fn is_available(self) -> bool {
        matches!(self, AllocationStatus::Available)
    }

    /// Archived is final; everything else can move.
    pub fn is_terminal(self) -> bool {
        matches!(self, AllocationStatus::Archived)
    }
}

impl core::fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            AllocationStatus::Available => "available",
            AllocationStatus::ReservedForSale => "reserved_for_sale",
            AllocationStatus::Rented => "rented",
            AllocationStatus::Swapped => "swapped",
            AllocationStatus::Archived => "archived",
        };
        f.write_str(s)
    }
}

/// A tradable physical item listed by a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub owner_id: UserId,
    pub name: String,
    pub kind: ListingKind,
    pub status: AllocationStatus,
    /// Sale price in smallest currency unit (cents). Required for sale
    /// listings, absent otherwise. Snapshotted onto order lines at
    /// checkout time — never re-read from here after that.
    pub price: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Validate and construct a fresh listing (status starts `available`).
    pub fn new_listing(
        id: ItemId,
        owner_id: UserId,
        name: impl Into<String>,
        kind: ListingKind,
        price: Option<u64>,
        created_at: DateTime<Utc>,
    ) -> ExchangeResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ExchangeError::validation("item name cannot be empty"));
        }
        match (kind, price) {
            (ListingKind::Sale, None) => {
                return Err(ExchangeError::validation("sale listing requires a price"));
            }
            (ListingKind::Sale, Some(0)) => {
                return Err(ExchangeError::validation("sale price must be positive"));
            }
            _ => {}
        }

        Ok(Self {
            id,
            owner_id,
            name,
            kind,
            status: AllocationStatus::Available,
            price,
            created_at,
        })
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
    }

    /// Guard used before any exchange claims the item.
    pub fn ensure_kind(&self, expected: ListingKind) -> ExchangeResult<()> {
        if self.kind != expected {
            return Err(ExchangeError::validation(format!(
                "item is a {} listing, not {}",
                self.kind, expected
            )));
        }
        Ok(())
    }

    /// Sale price for checkout; absent price on a sale listing is a data
    /// fault surfaced as unavailable rather than a panic.
    pub fn sale_price(&self) -> ExchangeResult<u64> {
        self.price
            .ok_or_else(|| ExchangeError::item_unavailable(format!("{} has no sale price", self.id)))
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
