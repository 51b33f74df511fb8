//! Range streaming semantics over the HTTP surface.

use axum::http::{StatusCode, header};
use futures::StreamExt;

use crate::support::{
    DEMO_FILE_LENGTH, DEMO_HASH, DEMO_MAGNET, add_torrent, body_bytes, body_json, demo_bytes, get,
    get_with_range, seeded_app, wait_for_status,
};

fn stream_uri(file_index: usize) -> String {
    format!("/api/stream/{DEMO_HASH}/{file_index}")
}

async fn ready_app() -> crate::support::TestApp {
    let test_app = seeded_app();
    add_torrent(&test_app.app, DEMO_MAGNET).await;
    wait_for_status(&test_app.app, DEMO_HASH, "done").await;
    test_app
}

#[tokio::test]
async fn full_request_streams_the_whole_file() {
    let test_app = ready_app().await;

    let response = get(&test_app.app, &stream_uri(0)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers().clone();
    assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(
        headers[header::CONTENT_LENGTH],
        DEMO_FILE_LENGTH.to_string().as_str()
    );
    assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
    assert_eq!(headers[header::CONTENT_DISPOSITION], "inline");

    assert_eq!(body_bytes(response).await, demo_bytes());
}

#[tokio::test]
async fn bounded_range_returns_exactly_the_window() {
    let test_app = ready_app().await;

    let response = get_with_range(&test_app.app, &stream_uri(0), "bytes=100-199").await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers()[header::CONTENT_RANGE],
        format!("bytes 100-199/{DEMO_FILE_LENGTH}").as_str()
    );
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "100");

    let body = body_bytes(response).await;
    assert_eq!(body, &demo_bytes()[100..200]);
}

#[tokio::test]
async fn open_ended_range_runs_to_the_last_byte() {
    let test_app = ready_app().await;

    let response = get_with_range(&test_app.app, &stream_uri(0), "bytes=500-").await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers()[header::CONTENT_RANGE],
        format!("bytes 500-999/{DEMO_FILE_LENGTH}").as_str()
    );

    let body = body_bytes(response).await;
    assert_eq!(body.len(), DEMO_FILE_LENGTH - 500);
    assert_eq!(body, &demo_bytes()[500..]);
}

#[tokio::test]
async fn overlong_end_is_clamped() {
    let test_app = ready_app().await;

    let response = get_with_range(&test_app.app, &stream_uri(0), "bytes=900-5000").await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers()[header::CONTENT_RANGE],
        format!("bytes 900-999/{DEMO_FILE_LENGTH}").as_str()
    );
    assert_eq!(body_bytes(response).await.len(), 100);
}

#[tokio::test]
async fn start_past_the_file_is_unsatisfiable() {
    let test_app = ready_app().await;

    let response = get_with_range(
        &test_app.app,
        &stream_uri(0),
        &format!("bytes={DEMO_FILE_LENGTH}-"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(
        response.headers()[header::CONTENT_RANGE],
        format!("bytes */{DEMO_FILE_LENGTH}").as_str()
    );
}

#[tokio::test]
async fn malformed_range_degrades_to_full_response() {
    let test_app = ready_app().await;

    let response = get_with_range(&test_app.app, &stream_uri(0), "bytes=abc-def").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await.len(), DEMO_FILE_LENGTH);
}

#[tokio::test]
async fn the_two_404_causes_are_distinguishable() {
    let test_app = ready_app().await;

    let response = get(
        &test_app.app,
        "/api/stream/ffffffffffffffffffffffffffffffffffffffff/0",
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Torrent not found");

    let response = get(&test_app.app, &stream_uri(7)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "File not found");
}

#[tokio::test]
async fn dropping_one_stream_leaves_a_concurrent_one_intact() {
    let test_app = ready_app().await;

    let doomed = get(&test_app.app, &stream_uri(0)).await;
    let survivor = get(&test_app.app, &stream_uri(0)).await;

    // Pull one frame off the first stream, then abandon it mid-body.
    let mut doomed_body = doomed.into_body().into_data_stream();
    assert!(doomed_body.next().await.is_some());
    drop(doomed_body);

    assert_eq!(body_bytes(survivor).await, demo_bytes());
}

#[tokio::test]
async fn streaming_works_while_the_transfer_is_still_active() {
    // Slow pacing keeps the record Active for the whole test: metadata
    // lands immediately but completion stays far away.
    let test_app = crate::support::empty_app_with(spindrift_core::config::FetchConfig {
        metadata_delay: std::time::Duration::ZERO,
        progress_interval: std::time::Duration::from_secs(1),
        progress_steps: 60,
        ..spindrift_core::config::FetchConfig::default()
    });
    test_app.engine.seed(
        DEMO_MAGNET,
        "Demo",
        vec![spindrift_core::fetch::SimFile::new("demo.mp4", demo_bytes())],
    );
    add_torrent(&test_app.app, DEMO_MAGNET).await;
    wait_for_status(&test_app.app, DEMO_HASH, "active").await;

    let response = get_with_range(&test_app.app, &stream_uri(0), "bytes=0-99").await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(body_bytes(response).await, &demo_bytes()[..100]);
}
