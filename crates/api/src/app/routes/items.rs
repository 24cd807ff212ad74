use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use campustrade_core::ItemId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(list_item))
        .route("/:id", get(get_item))
        .route("/:id/archive", post(archive_item))
}

pub async fn list_item(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ListItemRequest>,
) -> axum::response::Response {
    match services
        .engine
        .list_item(body.owner_id, body.name, body.kind, body.price)
    {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<Uuid>,
) -> axum::response::Response {
    match services.engine.item(ItemId::from(id)) {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn archive_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<Uuid>,
    Json(body): Json<dto::ActorRequest>,
) -> axum::response::Response {
    match services.engine.archive_item(ItemId::from(id), body.actor_id) {
        Ok(archival) => (StatusCode::OK, Json(archival)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}
