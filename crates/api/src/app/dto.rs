use serde::Deserialize;
use uuid::Uuid;

use campustrade_core::{ItemId, UserId};
use campustrade_items::ListingKind;
use campustrade_orders::MeetupDetails;
use campustrade_ratings::ExchangeKind;
use campustrade_rentals::RequestStatus;
use campustrade_swaps::OfferStatus;

// -------------------------
// Request DTOs
// -------------------------
//
// Authentication is out of scope; callers identify themselves explicitly
// in the request body.

#[derive(Debug, Deserialize)]
pub struct ListItemRequest {
    pub owner_id: UserId,
    pub name: String,
    pub kind: ListingKind,
    pub price: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ActorRequest {
    pub actor_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct CreateRentalRequest {
    pub item_id: ItemId,
    pub requester_id: UserId,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRentalStatusRequest {
    pub status: RequestStatus,
    pub actor_id: UserId,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSwapOfferRequest {
    pub target_item_id: ItemId,
    pub requester_id: UserId,
    pub offered_item_id: Option<ItemId>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSwapStatusRequest {
    pub status: OfferStatus,
    pub actor_id: UserId,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub buyer_id: UserId,
    pub lines: Vec<CheckoutLineRequest>,
    #[serde(default)]
    pub meetup: MeetupDetails,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutLineRequest {
    pub item_id: ItemId,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct CancelOrderRequest {
    pub actor_id: UserId,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRatingRequest {
    pub rater_id: UserId,
    pub counterpart_id: UserId,
    pub kind: ExchangeKind,
    pub exchange_id: Uuid,
    pub score: u8,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RatingGateQuery {
    pub rater_id: UserId,
    pub counterpart_id: UserId,
    pub kind: ExchangeKind,
    pub exchange_id: Uuid,
}
