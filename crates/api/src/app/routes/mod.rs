use axum::{routing::get, Router};

pub mod orders;
pub mod products;
pub mod system;

pub fn router() -> Router {
    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .nest("/products", products::router())
        .nest("/orders", orders::router())
}
