//! JSON API contract tests.

use axum::http::StatusCode;
use serde_json::json;

use crate::support::{
    DEMO_FILE_LENGTH, DEMO_HASH, DEMO_MAGNET, add_torrent, body_json, delete, get, post_json,
    seeded_app, wait_for_status,
};

#[tokio::test]
async fn add_answers_with_loading_placeholder() {
    let test_app = seeded_app();

    let (status, body) = add_torrent(&test_app.app, DEMO_MAGNET).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["infoHash"].is_null());
    assert_eq!(body["name"], "Loading...");
    assert_eq!(body["status"], "adding");
}

#[tokio::test]
async fn re_adding_reports_already_added() {
    let test_app = seeded_app();

    add_torrent(&test_app.app, DEMO_MAGNET).await;
    wait_for_status(&test_app.app, DEMO_HASH, "done").await;

    let (status, body) = add_torrent(&test_app.app, DEMO_MAGNET).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "already_added");
    assert_eq!(body["infoHash"], DEMO_HASH);
    assert_eq!(body["name"], "Demo");
}

#[tokio::test]
async fn add_without_magnet_is_rejected() {
    let test_app = seeded_app();

    let response = post_json(&test_app.app, "/api/add-torrent", json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("magnetURI"));

    let response = post_json(
        &test_app.app,
        "/api/add-torrent",
        json!({ "magnetURI": "   " }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_projection_carries_the_full_contract() {
    let test_app = seeded_app();
    add_torrent(&test_app.app, DEMO_MAGNET).await;

    let body = wait_for_status(&test_app.app, DEMO_HASH, "done").await;

    assert_eq!(body["infoHash"], DEMO_HASH);
    assert_eq!(body["name"], "Demo");
    assert_eq!(body["length"], DEMO_FILE_LENGTH);
    assert_eq!(body["progress"], 1.0);
    assert_eq!(body["downloadSpeed"], 0);
    assert!(body["uploadSpeed"].is_u64());
    assert!(body["numPeers"].is_u64());

    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["name"], "demo.mp4");
    assert_eq!(files[0]["path"], "demo.mp4");
    assert_eq!(files[0]["length"], DEMO_FILE_LENGTH);
    assert_eq!(files[0]["index"], 0);
}

#[tokio::test]
async fn invalid_hash_is_a_bad_request() {
    let test_app = seeded_app();
    let response = get(&test_app.app, "/api/torrent/not-a-hash").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_hash_is_not_found() {
    let test_app = seeded_app();
    let response = get(
        &test_app.app,
        "/api/torrent/ffffffffffffffffffffffffffffffffffffffff",
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Torrent not found");
}

#[tokio::test]
async fn list_reflects_registered_records() {
    let test_app = seeded_app();

    let response = get(&test_app.app, "/api/torrents").await;
    assert_eq!(body_json(response).await, json!([]));

    add_torrent(&test_app.app, DEMO_MAGNET).await;
    wait_for_status(&test_app.app, DEMO_HASH, "done").await;

    let response = get(&test_app.app, "/api/torrents").await;
    let list = body_json(response).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["infoHash"], DEMO_HASH);
}

#[tokio::test]
async fn delete_removes_the_record() {
    let test_app = seeded_app();
    add_torrent(&test_app.app, DEMO_MAGNET).await;
    wait_for_status(&test_app.app, DEMO_HASH, "done").await;

    let response = delete(&test_app.app, &format!("/api/torrent/{DEMO_HASH}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(&test_app.app, &format!("/api/torrent/{DEMO_HASH}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = delete(&test_app.app, &format!("/api/torrent/{DEMO_HASH}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_record_count() {
    let test_app = seeded_app();
    add_torrent(&test_app.app, DEMO_MAGNET).await;

    let response = get(&test_app.app, "/api/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["torrents"], 1);
}
