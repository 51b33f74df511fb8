//! Shared helpers for driving the router in-process.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode, header};
use serde_json::{Value, json};
use spindrift_core::config::FetchConfig;
use spindrift_core::fetch::{SimFetchEngine, SimFile};
use spindrift_core::registry::spawn_registry;
use spindrift_web::{AppState, router};
use tower::ServiceExt;

/// Magnet descriptor whose btih is [`DEMO_HASH`].
pub const DEMO_MAGNET: &str =
    "magnet:?xt=urn:btih:0123456789abcdef0123456789abcdef01234567&dn=Demo";
pub const DEMO_HASH: &str = "0123456789abcdef0123456789abcdef01234567";
pub const DEMO_FILE_LENGTH: usize = 1000;

pub struct TestApp {
    pub app: Router,
    pub engine: Arc<SimFetchEngine>,
}

fn fast_config() -> FetchConfig {
    FetchConfig {
        metadata_delay: Duration::ZERO,
        progress_interval: Duration::from_millis(1),
        progress_steps: 2,
        ..FetchConfig::default()
    }
}

/// Deterministic content for the demo file: `data()[i] == i % 251`.
pub fn demo_bytes() -> Vec<u8> {
    (0..DEMO_FILE_LENGTH).map(|i| (i % 251) as u8).collect()
}

/// Builds a router over an empty simulation engine.
pub fn empty_app() -> TestApp {
    empty_app_with(fast_config())
}

/// Builds a router over an empty simulation engine with custom pacing.
pub fn empty_app_with(config: FetchConfig) -> TestApp {
    let engine = Arc::new(SimFetchEngine::new(config));
    let registry = spawn_registry(engine.clone());
    let state = AppState {
        registry,
        engine: engine.clone(),
        started_at: Instant::now(),
    };
    TestApp {
        app: router(state),
        engine,
    }
}

/// Builds a router with the demo magnet pre-seeded (one mp4 file).
pub fn seeded_app() -> TestApp {
    let test_app = empty_app();
    test_app.engine.seed(
        DEMO_MAGNET,
        "Demo",
        vec![SimFile::new("demo.mp4", demo_bytes())],
    );
    test_app
}

/// Sends one request to a clone of the router.
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone()
        .oneshot(request)
        .await
        .expect("router never fails at the service level")
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn get_with_range(app: &Router, uri: &str, range: &str) -> Response<Body> {
    send(
        app,
        Request::get(uri)
            .header(header::RANGE, range)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn delete(app: &Router, uri: &str) -> Response<Body> {
    send(
        app,
        Request::builder()
            .method(Method::DELETE)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    send(
        app,
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

/// Submits a magnet descriptor, returning the response JSON.
pub async fn add_torrent(app: &Router, magnet: &str) -> (StatusCode, Value) {
    let response = post_json(app, "/api/add-torrent", json!({ "magnetURI": magnet })).await;
    let status = response.status();
    (status, body_json(response).await)
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body collection failed")
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("body was not JSON")
}

/// Polls a torrent's status projection until it reports `status`.
pub async fn wait_for_status(app: &Router, info_hash: &str, status: &str) -> Value {
    for _ in 0..200 {
        let response = get(app, &format!("/api/torrent/{info_hash}")).await;
        if response.status() == StatusCode::OK {
            let value = body_json(response).await;
            if value["status"] == status {
                return value;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("torrent {info_hash} never reached status {status}");
}

/// Polls the list projection until some record reports `status`.
pub async fn wait_for_listed_status(app: &Router, status: &str) -> Value {
    for _ in 0..200 {
        let response = get(app, "/api/torrents").await;
        let list = body_json(response).await;
        if let Some(record) = list
            .as_array()
            .and_then(|records| records.iter().find(|r| r["status"] == status))
        {
            return record.clone();
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("no record ever reached status {status}");
}
