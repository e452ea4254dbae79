use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::app::errors;
use crate::app::services::AppServices;

pub async fn root(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    Json(json!({
        "message": "Order Desk API is running",
        "store": services.store().backend(),
    }))
}

/// Liveness plus a round-trip to the store.
pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let store = services.store();
    match store.stats().await {
        Ok(stats) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "store": store.backend(),
                "stats": stats,
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "store": store.backend(),
                })),
            )
                .into_response()
        }
    }
}

pub async fn not_found() -> axum::response::Response {
    errors::json_error(StatusCode::NOT_FOUND, "not_found", "route not found")
}
