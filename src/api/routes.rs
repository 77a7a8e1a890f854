use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::auth::{auth_middleware, AuthService};
use crate::service::QrService;

use super::handlers::{
    create_category, create_short_code, delete_category, delete_qrcode, get_qrcode, health_check,
    list_categories, list_qrcodes, palette, qrcode_analytics, qrcode_image, record_category_view,
    rename_qrcode, render, retarget_qrcode, save_qrcode, set_qrcode_category, set_qrcode_status,
    AppState,
};

/// Logo uploads may be larger than axum's default body limit.
const MAX_LOGO_BYTES: usize = 10 * 1024 * 1024;

pub fn create_api_router(service: QrService, auth_service: Arc<AuthService>) -> Router {
    let state = Arc::new(AppState { service });

    let protected_routes = Router::new()
        .route("/qrcodes", post(save_qrcode).get(list_qrcodes))
        .route("/qrcodes/{id}", get(get_qrcode).delete(delete_qrcode))
        .route("/qrcodes/{id}/name", put(rename_qrcode))
        .route("/qrcodes/{id}/category", put(set_qrcode_category))
        .route("/qrcodes/{id}/target", put(retarget_qrcode))
        .route("/qrcodes/{id}/status", put(set_qrcode_status))
        .route("/qrcodes/{id}/short-code", post(create_short_code))
        .route("/qrcodes/{id}/image", get(qrcode_image))
        .route("/qrcodes/{id}/analytics", get(qrcode_analytics))
        .route("/categories", post(create_category).get(list_categories))
        .route("/categories/{id}", delete(delete_category))
        .route("/categories/{id}/views", post(record_category_view))
        .route("/render", post(render))
        .route(
            "/palette",
            post(palette).layer(DefaultBodyLimit::max(MAX_LOGO_BYTES)),
        )
        .route_layer(middleware::from_fn_with_state(auth_service, auth_middleware))
        .with_state(state);

    let api = Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes);

    Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
}
