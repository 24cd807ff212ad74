use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use uuid::Uuid;

use campustrade_core::OfferId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/offers", post(create_offer))
        .route("/offers/:id/status", post(update_status))
}

pub async fn create_offer(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateSwapOfferRequest>,
) -> axum::response::Response {
    match services.engine.offer_swap(
        body.target_item_id,
        body.requester_id,
        body.offered_item_id,
        body.note,
    ) {
        Ok(offer) => (StatusCode::CREATED, Json(offer)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<Uuid>,
    Json(body): Json<dto::UpdateSwapStatusRequest>,
) -> axum::response::Response {
    match services.engine.update_swap_status(
        OfferId::from(id),
        body.status,
        body.actor_id,
        body.reason,
    ) {
        Ok(update) => (StatusCode::OK, Json(update)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}
