use axum::{middleware::from_fn, routing::get, routing::post, Router};
use service_core::middleware::{metrics::metrics_middleware, tracing::request_id_middleware};
use time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::handlers::{
    app::{health_check, index},
    draft::{
        add_item, commit_discount, commit_item, remove_item, update_customer, update_discount,
        update_item,
    },
    invoice::{download_invoice, save_invoice},
};
use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    // Drafts live in memory for the lifetime of the process.
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false) // Set to true in production with HTTPS
        .with_expiry(Expiry::OnInactivity(Duration::hours(24)));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/metrics", get(crate::handlers::metrics::metrics))
        .route("/draft/customer", post(update_customer))
        .route("/draft/items", post(add_item))
        .route("/draft/items/:index", post(update_item))
        .route("/draft/items/:index/commit", post(commit_item))
        .route("/draft/items/:index/remove", post(remove_item))
        .route("/draft/discount", post(update_discount))
        .route("/draft/discount/commit", post(commit_discount))
        .route("/invoices", post(save_invoice))
        .route("/invoices/:number/download", get(download_invoice))
        .layer(session_layer)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
