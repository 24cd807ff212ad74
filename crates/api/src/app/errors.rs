use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use campustrade_core::ExchangeError;

pub fn error_to_response(err: ExchangeError) -> axum::response::Response {
    match err {
        ExchangeError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        ExchangeError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        ExchangeError::InvalidTransition(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_transition", msg)
        }
        ExchangeError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        ExchangeError::ItemUnavailable(msg) => {
            json_error(StatusCode::CONFLICT, "item_unavailable", msg)
        }
        ExchangeError::DuplicateRating => json_error(
            StatusCode::CONFLICT,
            "duplicate_rating",
            "this exchange has already been rated",
        ),
        ExchangeError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
        ExchangeError::Internal(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
