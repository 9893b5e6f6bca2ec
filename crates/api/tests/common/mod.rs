#![allow(dead_code)]

use std::sync::Arc;

use assetflow_api::config::ServerConfig;
use assetflow_api::router::build_app_router;
use assetflow_api::state::AppState;
use assetflow_remote::PipelineApi;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

pub const TEST_API_KEY: &str = "test-api-key";

/// Build a test `ServerConfig` pointing at `base_url`.
pub fn test_config(base_url: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 5,
        base_url: base_url.to_string(),
        api_key: Some(TEST_API_KEY.to_string()),
    }
}

/// Build the full application router, with the production middleware
/// stack, proxying to `base_url`.
pub fn build_test_app(base_url: &str) -> Router {
    let config = test_config(base_url);
    let pipeline = PipelineApi::new(config.remote()).unwrap();
    let state = AppState {
        pipeline: Arc::new(pipeline),
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// Serve `router` on an ephemeral port as the fake upstream pipeline and
/// return its base URL.
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// A base URL nothing listens on.
pub async fn unreachable_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_form(app: Router, uri: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
