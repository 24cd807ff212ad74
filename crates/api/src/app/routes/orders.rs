use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use campustrade_core::OrderId;
use campustrade_engine::CheckoutLine;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/checkout", post(checkout))
        .route("/:id", get(get_order))
        .route("/:id/cancel", post(cancel_order))
        .route("/:id/complete", post(complete_order))
}

pub fn cart_router() -> Router {
    Router::new().route("/items", post(add_to_cart))
}

pub async fn checkout(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CheckoutRequest>,
) -> axum::response::Response {
    let lines = body
        .lines
        .into_iter()
        .map(|l| CheckoutLine {
            item_id: l.item_id,
            quantity: l.quantity,
        })
        .collect();

    match services.engine.checkout(body.buyer_id, lines, body.meetup) {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<Uuid>,
) -> axum::response::Response {
    match services.engine.order(OrderId::from(id)) {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn cancel_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<Uuid>,
    Json(body): Json<dto::CancelOrderRequest>,
) -> axum::response::Response {
    match services
        .engine
        .cancel_order(OrderId::from(id), body.actor_id, body.reason)
    {
        Ok(cancellation) => (StatusCode::OK, Json(cancellation)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn complete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<Uuid>,
    Json(body): Json<dto::ActorRequest>,
) -> axum::response::Response {
    match services
        .engine
        .complete_order(OrderId::from(id), body.actor_id)
    {
        Ok(completion) => (StatusCode::OK, Json(completion)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn add_to_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::AddToCartRequest>,
) -> axum::response::Response {
    match services
        .engine
        .add_to_cart(body.user_id, body.item_id, body.quantity)
    {
        Ok(()) => (StatusCode::NO_CONTENT, ()).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}
