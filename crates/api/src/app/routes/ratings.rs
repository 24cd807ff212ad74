use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use campustrade_ratings::RatingKey;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(submit_rating))
        .route("/gate", get(rating_gate))
}

pub async fn submit_rating(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::SubmitRatingRequest>,
) -> axum::response::Response {
    let key = RatingKey {
        rater_id: body.rater_id,
        counterpart_id: body.counterpart_id,
        kind: body.kind,
        exchange_id: body.exchange_id,
    };
    match services.engine.submit_rating(key, body.score, body.text) {
        Ok(rating) => (StatusCode::CREATED, Json(rating)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

/// Whether the rate-me prompt should still be shown for an exchange.
pub async fn rating_gate(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::RatingGateQuery>,
) -> axum::response::Response {
    let key = RatingKey {
        rater_id: query.rater_id,
        counterpart_id: query.counterpart_id,
        kind: query.kind,
        exchange_id: query.exchange_id,
    };
    match services.engine.should_rate(key) {
        Ok(should_rate) => (
            StatusCode::OK,
            Json(serde_json::json!({"should_rate": should_rate})),
        )
            .into_response(),
        Err(e) => errors::error_to_response(e),
    }
}
