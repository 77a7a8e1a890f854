//! Management API integration tests
//!
//! Runs the API router against in-memory SQLite and an in-memory object
//! store, with authentication disabled so the owner comes from
//! `X-Owner-Id`.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use qrstudio::api;
use qrstudio::auth::{AuthService, OWNER_HEADER};
use qrstudio::cursor::CursorSigner;
use qrstudio::objects::{MemoryObjectStore, ObjectStore};
use qrstudio::service::QrService;
use qrstudio::storage::{SqliteStorage, Storage};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    app: Router,
    storage: Arc<dyn Storage>,
    objects: Arc<MemoryObjectStore>,
}

async fn setup() -> TestApp {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    let storage: Arc<dyn Storage> = Arc::new(storage);
    let objects = Arc::new(MemoryObjectStore::new());
    let object_store: Arc<dyn ObjectStore> = objects.clone();

    let service = QrService::new(
        Arc::clone(&storage),
        object_store,
        "https://go.test",
        CursorSigner::new(Some("integration-secret")),
    );
    let app = api::create_api_router(service, Arc::new(AuthService::Disabled));
    TestApp { app, storage, objects }
}

fn request(method: Method, uri: &str, owner: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(OWNER_HEADER, owner);
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn save(app: &Router, owner: &str, url: &str) -> Value {
    let (status, body) = send(
        app,
        request(
            Method::POST,
            "/api/qrcodes",
            owner,
            Some(json!({ "style": { "content": { "type": "url", "value": url } } })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn test_health_needs_no_owner() {
    let t = setup().await;
    let req = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
    let (status, body) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
}

#[tokio::test]
async fn test_save_fetch_and_list() {
    let t = setup().await;
    let saved = save(&t.app, "alice", "example.com/menu").await;

    let id = saved["unique_id"].as_str().unwrap().to_string();
    assert_eq!(saved["name"], "example.com");
    assert_eq!(saved["status"], "active");
    assert_eq!(saved["image_stored"], true);
    assert_eq!(saved["redirect_url"], format!("https://go.test/qr/{id}"));
    assert_eq!(t.objects.len().await, 1);

    let (status, fetched) = send(&t.app, request(Method::GET, &format!("/api/qrcodes/{id}"), "alice", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["target_url"], "https://example.com/menu");

    let (status, _) = send(&t.app, request(Method::GET, &format!("/api/qrcodes/{id}"), "bob", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    save(&t.app, "alice", "https://two.test").await;
    let (status, page) = send(&t.app, request(Method::GET, "/api/qrcodes?limit=1", "alice", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["qrcodes"].as_array().unwrap().len(), 1);
    assert_eq!(page["has_more"], true);

    let cursor = page["next_cursor"].as_str().unwrap();
    let (_, next) = send(
        &t.app,
        request(Method::GET, &format!("/api/qrcodes?limit=1&cursor={cursor}"), "alice", None),
    )
    .await;
    assert_eq!(next["qrcodes"][0]["unique_id"], id);
    assert_eq!(next["has_more"], false);
}

#[tokio::test]
async fn test_invalid_content_is_rejected() {
    let t = setup().await;
    let (status, body) = send(
        &t.app,
        request(
            Method::POST,
            "/api/qrcodes",
            "alice",
            Some(json!({ "style": { "content": { "type": "phone", "value": "12" } } })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please enter a valid phone number");
    assert!(t.objects.is_empty().await);
}

#[tokio::test]
async fn test_short_code_conflict_and_retarget_sync() {
    let t = setup().await;
    let saved = save(&t.app, "alice", "https://first.test").await;
    let id = saved["unique_id"].as_str().unwrap();
    let uri = format!("/api/qrcodes/{id}/short-code");

    let (status, created) = send(
        &t.app,
        request(Method::POST, &uri, "alice", Some(json!({ "short_code": "promo1" }))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["short_link"], "https://go.test/r/promo1");

    let (status, body) = send(
        &t.app,
        request(Method::POST, &uri, "alice", Some(json!({ "short_code": "promo1" }))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Short code already in use");

    let (status, generated) = send(&t.app, request(Method::POST, &uri, "alice", None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(generated["short_code"].as_str().unwrap().len(), 8);

    let (status, updated) = send(
        &t.app,
        request(
            Method::PUT,
            &format!("/api/qrcodes/{id}/target"),
            "alice",
            Some(json!({ "url": "https://second.test" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["target_url"], "https://second.test");

    let short = t.storage.get_short_url("promo1").await.unwrap().unwrap();
    assert_eq!(short.current_url, "https://second.test");
}

#[tokio::test]
async fn test_rename_status_and_delete() {
    let t = setup().await;
    let saved = save(&t.app, "alice", "https://x.test").await;
    let id = saved["unique_id"].as_str().unwrap();

    let (status, renamed) = send(
        &t.app,
        request(Method::PUT, &format!("/api/qrcodes/{id}/name"), "alice", Some(json!({ "name": "Window sticker" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Window sticker");

    let (status, paused) = send(
        &t.app,
        request(Method::PUT, &format!("/api/qrcodes/{id}/status"), "alice", Some(json!({ "status": "inactive" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paused["status"], "inactive");

    let (status, _) = send(&t.app, request(Method::DELETE, &format!("/api/qrcodes/{id}"), "alice", None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(t.objects.is_empty().await);
    assert!(t.storage.get_qrcode(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_categories() {
    let t = setup().await;
    let (status, category) = send(
        &t.app,
        request(Method::POST, "/api/categories", "alice", Some(json!({ "name": "Events" }))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(category["color"], "#4F46E5");
    let category_id = category["id"].as_i64().unwrap();

    let saved = save(&t.app, "alice", "https://x.test").await;
    let id = saved["unique_id"].as_str().unwrap();
    let (status, assigned) = send(
        &t.app,
        request(
            Method::PUT,
            &format!("/api/qrcodes/{id}/category"),
            "alice",
            Some(json!({ "category_id": category_id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["category_id"], category_id);

    let (status, viewed) = send(
        &t.app,
        request(Method::POST, &format!("/api/categories/{category_id}/views"), "alice", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(viewed["view_count"], 1);

    let (status, _) = send(
        &t.app,
        request(Method::DELETE, &format!("/api/categories/{category_id}"), "alice", None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let record = t.storage.get_qrcode(id).await.unwrap().unwrap();
    assert!(record.category_id.is_none());
}

#[tokio::test]
async fn test_image_is_rerendered_when_missing() {
    let t = setup().await;
    let saved = save(&t.app, "alice", "https://x.test").await;
    let id = saved["unique_id"].as_str().unwrap();
    t.objects
        .delete(&format!("qrcodes/alice/{id}.png"))
        .await
        .unwrap();

    let response = t
        .app
        .clone()
        .oneshot(request(Method::GET, &format!("/api/qrcodes/{id}/image"), "alice", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..4], b"\x89PNG");
    assert_eq!(t.objects.len().await, 1);
}

#[tokio::test]
async fn test_render_download() {
    let t = setup().await;
    let response = t
        .app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/render",
            "alice",
            Some(json!({ "style": {}, "preset": "rounded", "format": "webp" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/webp");
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"qr-code-"));
    assert!(disposition.ends_with(".webp\""));
}

#[tokio::test]
async fn test_palette_rejects_garbage() {
    let t = setup().await;
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/palette")
        .header(OWNER_HEADER, "alice")
        .body(Body::from(&b"not an image"[..]))
        .unwrap();
    let (status, body) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("decode"));
}

#[tokio::test]
async fn test_analytics_summary_for_new_code_is_empty() {
    let t = setup().await;
    let saved = save(&t.app, "alice", "https://x.test").await;
    let id = saved["unique_id"].as_str().unwrap();
    let (status, summary) = send(
        &t.app,
        request(Method::GET, &format!("/api/qrcodes/{id}/analytics"), "alice", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_scans"], 0);
    assert_eq!(summary["daily"], json!([]));
}

#[tokio::test]
async fn test_dotted_owner_still_stores_image() {
    let t = setup().await;
    let saved = save(&t.app, "..", "https://x.test").await;
    assert_eq!(saved["image_stored"], true);
    let id = saved["unique_id"].as_str().unwrap();

    let response = t
        .app
        .clone()
        .oneshot(request(Method::GET, &format!("/api/qrcodes/{id}/image"), "..", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
