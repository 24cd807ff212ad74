//! Per-user read endpoints: listings, exchanges, cart, inbox, ratings.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use campustrade_core::UserId;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/:id/items", get(items))
        .route("/:id/rentals", get(rentals))
        .route("/:id/swaps", get(swaps))
        .route("/:id/orders", get(orders))
        .route("/:id/cart", get(cart))
        .route("/:id/notifications", get(notifications))
        .route("/:id/ratings", get(ratings))
}

pub async fn items(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<Uuid>,
) -> axum::response::Response {
    match services.engine.items_owned_by(UserId::from(id)) {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn rentals(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<Uuid>,
) -> axum::response::Response {
    match services.engine.rental_requests_for_user(UserId::from(id)) {
        Ok(requests) => (StatusCode::OK, Json(requests)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn swaps(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<Uuid>,
) -> axum::response::Response {
    match services.engine.swap_offers_for_user(UserId::from(id)) {
        Ok(offers) => (StatusCode::OK, Json(offers)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn orders(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<Uuid>,
) -> axum::response::Response {
    match services.engine.orders_for_user(UserId::from(id)) {
        Ok(orders) => (StatusCode::OK, Json(orders)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn cart(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<Uuid>,
) -> axum::response::Response {
    match services.engine.cart_for_user(UserId::from(id)) {
        Ok(cart) => (StatusCode::OK, Json(cart)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn notifications(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<Uuid>,
) -> axum::response::Response {
    match services.engine.notifications_for_user(UserId::from(id)) {
        Ok(inbox) => (StatusCode::OK, Json(inbox)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn ratings(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<Uuid>,
) -> axum::response::Response {
    match services.engine.ratings_about(UserId::from(id)) {
        Ok(ratings) => (StatusCode::OK, Json(ratings)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}
