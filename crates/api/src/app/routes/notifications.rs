use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use uuid::Uuid;

use campustrade_core::NotificationId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/:id/read", post(mark_read))
}

pub async fn mark_read(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<Uuid>,
    Json(body): Json<dto::ActorRequest>,
) -> axum::response::Response {
    match services
        .engine
        .mark_notification_read(NotificationId::from(id), body.actor_id)
    {
        Ok(notification) => (StatusCode::OK, Json(notification)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}
