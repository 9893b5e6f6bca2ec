//! Integration tests for the `/pipeline/assets/*` proxy endpoints against a
//! fake upstream pipeline.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Form, Json, Router};
use common::{body_json, post_form, post_json, spawn_upstream, unreachable_upstream, TEST_API_KEY};
use serde_json::json;

fn auth_header(headers: &HeaderMap) -> String {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

/// Upstream whose stage endpoint counts calls and echoes the API key.
fn counting_stage_upstream(calls: Arc<AtomicUsize>) -> Router {
    Router::new()
        .route(
            "/pipeline/assets/stage",
            post(
                |State(calls): State<Arc<AtomicUsize>>, headers: HeaderMap| async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    assert_eq!(auth_header(&headers), TEST_API_KEY);
                    Json(json!({
                        "url": format!("http://uploads.test/{n}"),
                        "key": format!("key-{n}"),
                    }))
                },
            ),
        )
        .with_state(calls)
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stage_issues_one_upstream_call_per_slot() {
    let calls = Arc::new(AtomicUsize::new(0));
    let base = spawn_upstream(counting_stage_upstream(calls.clone())).await;
    let app = common::build_test_app(&base);

    let response = post_json(app, "/pipeline/assets/stage", json!({ "count": 3 })).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let slots = json["responses"].as_array().unwrap();
    assert_eq!(slots.len(), 3);
    assert!(slots.iter().all(|s| s["url"].is_string() && s["key"].is_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn stage_count_out_of_range_is_rejected_before_any_call() {
    let calls = Arc::new(AtomicUsize::new(0));
    let base = spawn_upstream(counting_stage_upstream(calls.clone())).await;

    for count in [0, 101] {
        let app = common::build_test_app(&base);
        let response = post_json(app, "/pipeline/assets/stage", json!({ "count": count })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "count must be between 1 and 100");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn stage_fails_as_a_whole_with_upstream_status() {
    let calls = Arc::new(AtomicUsize::new(0));
    let upstream = Router::new()
        .route(
            "/pipeline/assets/stage",
            post(|State(calls): State<Arc<AtomicUsize>>| async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n == 2 {
                    (
                        StatusCode::TOO_MANY_REQUESTS,
                        Json(json!({ "message": "quota exceeded" })),
                    )
                } else {
                    (StatusCode::OK, Json(json!({ "url": "http://u", "key": "k" })))
                }
            }),
        )
        .with_state(calls);
    let base = spawn_upstream(upstream).await;
    let app = common::build_test_app(&base);

    let response = post_json(app, "/pipeline/assets/stage", json!({ "count": 3 })).await;

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(response).await;
    assert_eq!(json["error"], "quota exceeded");
    assert!(json.get("responses").is_none());
}

// ---------------------------------------------------------------------------
// Process
// ---------------------------------------------------------------------------

#[tokio::test]
async fn process_forwards_form_and_returns_upstream_json() {
    let seen: Arc<Mutex<Vec<(String, String, String)>>> = Arc::default();
    let upstream = Router::new()
        .route(
            "/pipeline/assets/process",
            post(
                |State(seen): State<Arc<Mutex<Vec<(String, String, String)>>>>,
                 headers: HeaderMap,
                 Form(form): Form<std::collections::HashMap<String, String>>| async move {
                    seen.lock().unwrap().push((
                        auth_header(&headers),
                        form["key"].clone(),
                        form["pipeline"].clone(),
                    ));
                    Json(json!({ "taskId": "task-9", "queued": true }))
                },
            ),
        )
        .with_state(seen.clone());
    let base = spawn_upstream(upstream).await;
    let app = common::build_test_app(&base);

    let response = post_json(
        app,
        "/pipeline/assets/process",
        json!({ "key": "key-1", "pipeline": "dragonfly-img-basic" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["taskId"], "task-9");
    assert_eq!(json["queued"], true);
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[(
            TEST_API_KEY.to_string(),
            "key-1".to_string(),
            "dragonfly-img-basic".to_string()
        )]
    );
}

#[tokio::test]
async fn process_accepts_urlencoded_form_body() {
    let seen: Arc<Mutex<Vec<(String, String)>>> = Arc::default();
    let upstream = Router::new()
        .route(
            "/pipeline/assets/process",
            post(
                |State(seen): State<Arc<Mutex<Vec<(String, String)>>>>,
                 Form(form): Form<std::collections::HashMap<String, String>>| async move {
                    seen.lock()
                        .unwrap()
                        .push((form["key"].clone(), form["pipeline"].clone()));
                    Json(json!({ "taskId": 17 }))
                },
            ),
        )
        .with_state(seen.clone());
    let base = spawn_upstream(upstream).await;
    let app = common::build_test_app(&base);

    let response = post_form(
        app,
        "/pipeline/assets/process",
        "key=uploads%2Fkey-2&pipeline=dragonfly-img-basic",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["taskId"], "17");
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[("uploads/key-2".to_string(), "dragonfly-img-basic".to_string())]
    );
}

#[tokio::test]
async fn process_rejects_unsupported_body_type_before_upstream() {
    let app = common::build_test_app(&unreachable_upstream().await);

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/pipeline/assets/process")
        .header("content-type", "text/plain")
        .body(axum::body::Body::from("key=k&pipeline=p"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_is_served_as_a_named_download() {
    let upstream = Router::new().route(
        "/pipeline/assets/status",
        post(|Json(body): Json<serde_json::Value>| async move {
            Json(json!({
                "taskId": body["taskId"],
                "status": "SUCCEEDED",
                "title": "sunset",
            }))
        }),
    );
    let base = spawn_upstream(upstream).await;
    let app = common::build_test_app(&base);

    let response = post_json(app, "/pipeline/assets/status", json!({ "taskId": "task-9" })).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-disposition").unwrap(),
        "attachment; filename=sunset.json"
    );
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    let json = body_json(response).await;
    assert_eq!(json["status"], "SUCCEEDED");
    assert_eq!(json["taskId"], "task-9");
}

#[tokio::test]
async fn status_without_title_downloads_as_status_json() {
    let upstream = Router::new().route(
        "/pipeline/assets/status",
        post(|| async { Json(json!({ "status": "RUNNING" })) }),
    );
    let base = spawn_upstream(upstream).await;
    let app = common::build_test_app(&base);

    let response = post_json(app, "/pipeline/assets/status", json!({ "taskId": "t" })).await;

    assert_eq!(
        response.headers().get("content-disposition").unwrap(),
        "attachment; filename=status.json"
    );
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unreachable_upstream_is_a_sanitized_500() {
    let base = unreachable_upstream().await;
    let app = common::build_test_app(&base);

    let response = post_json(app, "/pipeline/assets/status", json!({ "taskId": "t" })).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Internal Server Error");
}

#[tokio::test]
async fn malformed_upstream_body_is_bad_gateway() {
    let upstream = Router::new().route(
        "/pipeline/assets/process",
        post(|| async { "definitely not json" }),
    );
    let base = spawn_upstream(upstream).await;
    let app = common::build_test_app(&base);

    let response = post_json(
        app,
        "/pipeline/assets/process",
        json!({ "key": "k", "pipeline": "p" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn upstream_error_without_json_keeps_status() {
    let upstream = Router::new().route(
        "/pipeline/assets/process",
        post(|| async { (StatusCode::FORBIDDEN, "Forbidden") }),
    );
    let base = spawn_upstream(upstream).await;
    let app = common::build_test_app(&base);

    let response = post_json(
        app,
        "/pipeline/assets/process",
        json!({ "key": "k", "pipeline": "p" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Forbidden");
}
