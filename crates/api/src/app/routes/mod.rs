use axum::Router;

pub mod items;
pub mod notifications;
pub mod orders;
pub mod ratings;
pub mod rentals;
pub mod swaps;
pub mod system;
pub mod users;

/// Router for all exchange endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/items", items::router())
        .nest("/rentals", rentals::router())
        .nest("/swaps", swaps::router())
        .nest("/orders", orders::router())
        .nest("/cart", orders::cart_router())
        .nest("/ratings", ratings::router())
        .nest("/notifications", notifications::router())
        .nest("/users", users::router())
}
