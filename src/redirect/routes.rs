use axum::{middleware, routing::get, Router};
use std::sync::Arc;

use super::handlers::{
    health_check, redirect_by_query, redirect_qr_code, redirect_short_code, RedirectState,
};
use super::middleware::capture_request_context;

pub fn create_redirect_router(state: RedirectState) -> Router {
    Router::new()
        .route("/", get(redirect_by_query))
        .route("/health", get(health_check))
        .route("/r/{code}", get(redirect_short_code))
        .route("/qr/{id}", get(redirect_qr_code))
        .route("/redirect/{id}", get(redirect_qr_code))
        .layer(middleware::from_fn(capture_request_context))
        .with_state(Arc::new(state))
}
