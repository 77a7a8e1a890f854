use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use std::sync::Arc;

use super::ApiError;
use crate::analytics::ScanSummary;
use crate::auth::Session;
use crate::models::{
    Category, CategoryAssignRequest, CreateCategoryRequest, ListQrQuery, QrCodePage, QrCodeRecord,
    RenameRequest, RenderRequest, RetargetRequest, SaveQrRequest, SaveQrResponse,
    ShortCodeRequest, ShortCodeResponse, StatusRequest,
};
use crate::palette::DerivedPalette;
use crate::service::{palette_for_logo, render_export, QrService};

pub struct AppState {
    pub service: QrService,
}

type ApiResult<T> = Result<T, ApiError>;

/// Run CPU-bound image work off the async workers.
async fn blocking<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> Result<T, crate::service::ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(format!("image task failed: {e}")))?
        .map_err(ApiError::from)
}

pub async fn save_qrcode(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(payload): Json<SaveQrRequest>,
) -> ApiResult<(StatusCode, Json<SaveQrResponse>)> {
    let saved = state.service.save(&session, payload).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn list_qrcodes(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(query): Query<ListQrQuery>,
) -> ApiResult<Json<QrCodePage>> {
    Ok(Json(state.service.list(&session, &query).await?))
}

pub async fn get_qrcode(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<Json<QrCodeRecord>> {
    Ok(Json(state.service.get(&session, &id).await?))
}

pub async fn delete_qrcode(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.service.delete(&session, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn rename_qrcode(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(payload): Json<RenameRequest>,
) -> ApiResult<Json<QrCodeRecord>> {
    Ok(Json(state.service.rename(&session, &id, &payload.name).await?))
}

pub async fn set_qrcode_category(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(payload): Json<CategoryAssignRequest>,
) -> ApiResult<Json<QrCodeRecord>> {
    Ok(Json(
        state
            .service
            .recategorize(&session, &id, payload.category_id)
            .await?,
    ))
}

pub async fn retarget_qrcode(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(payload): Json<RetargetRequest>,
) -> ApiResult<Json<QrCodeRecord>> {
    Ok(Json(state.service.retarget(&session, &id, &payload.url).await?))
}

pub async fn set_qrcode_status(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(payload): Json<StatusRequest>,
) -> ApiResult<Json<QrCodeRecord>> {
    Ok(Json(state.service.set_status(&session, &id, payload.status).await?))
}

/// The body is optional; without it a code is generated.
pub async fn create_short_code(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    payload: Option<Json<ShortCodeRequest>>,
) -> ApiResult<(StatusCode, Json<ShortCodeResponse>)> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let created = state.service.create_short_code(&session, &id, request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn qrcode_image(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let png = state.service.image(&session, &id).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

pub async fn qrcode_analytics(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<Json<ScanSummary>> {
    Ok(Json(state.service.analytics(&session, &id).await?))
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(payload): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = state.service.create_category(&session, payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.service.list_categories(&session).await?))
}

pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.service.delete_category(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn record_category_view(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Category>> {
    Ok(Json(state.service.record_category_view(&session, id).await?))
}

/// Download an unsaved design.
pub async fn render(Json(payload): Json<RenderRequest>) -> ApiResult<Response> {
    let epoch_ms = chrono::Utc::now().timestamp_millis();
    let export = blocking(move || render_export(&payload, epoch_ms)).await?;
    let disposition = format!("attachment; filename=\"{}\"", export.filename);
    Ok((
        [
            (header::CONTENT_TYPE, export.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.bytes,
    )
        .into_response())
}

/// Raw logo bytes in, derived palette out.
pub async fn palette(body: Bytes) -> ApiResult<Json<DerivedPalette>> {
    let palette = blocking(move || palette_for_logo(&body)).await?;
    Ok(Json(palette))
}

pub async fn health_check() -> impl IntoResponse {
    #[derive(Serialize)]
    struct HealthResponse {
        status: &'static str,
        version: &'static str,
    }

    Json(HealthResponse {
        status: "OK",
        version: env!("CARGO_PKG_VERSION"),
    })
}
