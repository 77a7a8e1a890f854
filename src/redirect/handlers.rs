use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

use super::middleware::RequestContext;
use super::resolver::{resolve, Lookup, Resolution};
use crate::analytics::{anonymize_ip, classify, extract_client_ip, ScanRecorder};
use crate::config::AnalyticsConfig;
use crate::models::{NewScan, ScanTarget, Utm};
use crate::storage::Storage;

const TIMING_HEADER: &str = "x-qrstudio-timing-ms";

pub struct RedirectState {
    pub storage: Arc<dyn Storage>,
    /// `None` when scan tracking is disabled.
    pub recorder: Option<Arc<ScanRecorder>>,
    pub analytics: AnalyticsConfig,
}

type QueryMap = BTreeMap<String, String>;

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// `GET /?shortcode=<code>`
pub async fn redirect_by_query(
    State(state): State<Arc<RedirectState>>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<QueryMap>,
    headers: HeaderMap,
) -> Response {
    let Some(code) = query
        .get("shortcode")
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
    else {
        return error_response(StatusCode::BAD_REQUEST, "Shortcode is required");
    };
    let code = code.to_string();
    respond(&state, Lookup::ShortCode(&code), StatusCode::MOVED_PERMANENTLY, &headers, &query, ctx).await
}

/// `GET /r/{code}`
pub async fn redirect_short_code(
    State(state): State<Arc<RedirectState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(code): Path<String>,
    Query(query): Query<QueryMap>,
    headers: HeaderMap,
) -> Response {
    respond(&state, Lookup::ShortCode(&code), StatusCode::MOVED_PERMANENTLY, &headers, &query, ctx).await
}

/// `GET /qr/{id}` and `GET /redirect/{id}`. Temporary, since the target can
/// be changed after printing.
pub async fn redirect_qr_code(
    State(state): State<Arc<RedirectState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(unique_id): Path<String>,
    Query(query): Query<QueryMap>,
    headers: HeaderMap,
) -> Response {
    respond(&state, Lookup::UniqueId(&unique_id), StatusCode::FOUND, &headers, &query, ctx).await
}

async fn respond(
    state: &RedirectState,
    lookup: Lookup<'_>,
    status: StatusCode,
    headers: &HeaderMap,
    query: &QueryMap,
    ctx: RequestContext,
) -> Response {
    match resolve(state.storage.as_ref(), lookup).await {
        Resolution::Redirecting { location, target } => {
            if let Some(recorder) = &state.recorder {
                recorder.record(build_scan(target, headers, query, ctx.peer, &state.analytics));
            }

            let elapsed_ms = ctx.started.elapsed().as_millis() as u64;
            debug!(?lookup, elapsed_ms, "Redirecting");
            let mut response = (status, [(header::LOCATION, location)]).into_response();
            let response_headers = response.headers_mut();
            response_headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
            response_headers.insert(TIMING_HEADER, HeaderValue::from(elapsed_ms));
            response
        }
        Resolution::NotFound => error_response(StatusCode::NOT_FOUND, "URL not found"),
        Resolution::Inactive => error_response(StatusCode::GONE, "This link is no longer active"),
        Resolution::Error => error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
    }
}

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Turn the request into a scan event.
pub fn build_scan(
    target: ScanTarget,
    headers: &HeaderMap,
    query: &QueryMap,
    peer: Option<SocketAddr>,
    config: &AnalyticsConfig,
) -> NewScan {
    let user_agent = header_string(headers, header::USER_AGENT).unwrap_or_default();
    let agent = classify(&user_agent);
    let ip = peer.map(|addr| {
        let ip = extract_client_ip(headers, addr.ip(), config);
        let ip = if config.ip_anonymization { anonymize_ip(ip) } else { ip };
        ip.to_string()
    });

    NewScan {
        target,
        scanned_at: chrono::Utc::now().timestamp(),
        referrer: header_string(headers, header::REFERER),
        device: agent.device,
        browser: agent.browser.to_string(),
        os: agent.os.to_string(),
        utm: Utm::from_query(query),
        ip,
        user_agent,
    }
}

pub async fn health_check() -> impl IntoResponse {
    #[derive(Serialize)]
    struct HealthResponse {
        status: &'static str,
    }

    Json(HealthResponse { status: "OK" })
}
