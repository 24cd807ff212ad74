use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use uuid::Uuid;

use campustrade_core::RequestId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/requests", post(create_request))
        .route("/requests/:id/status", post(update_status))
}

pub async fn create_request(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateRentalRequest>,
) -> axum::response::Response {
    match services.engine.request_rental(
        body.item_id,
        body.requester_id,
        body.start_date,
        body.end_date,
        body.comment,
    ) {
        Ok(request) => (StatusCode::CREATED, Json(request)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<Uuid>,
    Json(body): Json<dto::UpdateRentalStatusRequest>,
) -> axum::response::Response {
    match services.engine.update_rental_status(
        RequestId::from(id),
        body.status,
        body.actor_id,
        body.reason,
    ) {
        Ok(update) => (StatusCode::OK, Json(update)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}
