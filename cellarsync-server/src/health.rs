//! Liveness endpoint.

use axum::Router;
use axum::routing::get;

pub const STATUS_MESSAGE: &str = "cellarsync is running";

async fn status() -> &'static str {
    STATUS_MESSAGE
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(status))
        .route("/health", get(status))
}
