//! Registry lifecycle properties driven over HTTP.

use axum::http::StatusCode;

use spindrift_core::fetch::SimFile;

use crate::support::{
    DEMO_MAGNET, add_torrent, body_json, get, seeded_app, wait_for_listed_status, wait_for_status,
};

#[tokio::test]
async fn concurrent_adds_create_exactly_one_record() {
    let test_app = seeded_app();

    let mut joins = Vec::new();
    for _ in 0..8 {
        let app = test_app.app.clone();
        joins.push(tokio::spawn(async move {
            add_torrent(&app, DEMO_MAGNET).await
        }));
    }

    let mut newly_added = 0;
    for join in joins {
        let (status, body) = join.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        if body["status"] == "adding" {
            newly_added += 1;
        } else {
            assert_eq!(body["status"], "already_added");
        }
    }
    assert_eq!(newly_added, 1);

    let response = get(&test_app.app, "/api/torrents").await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn distinct_descriptors_resolve_to_distinct_hashes() {
    let test_app = seeded_app();
    test_app.engine.seed(
        "magnet:?xt=urn:btih:aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa&dn=Other",
        "Other",
        vec![SimFile::new("other.mkv", vec![3u8; 64])],
    );

    add_torrent(&test_app.app, DEMO_MAGNET).await;
    add_torrent(
        &test_app.app,
        "magnet:?xt=urn:btih:aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa&dn=Other",
    )
    .await;

    wait_for_status(&test_app.app, "0123456789abcdef0123456789abcdef01234567", "done").await;
    wait_for_status(&test_app.app, "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "done").await;

    let response = get(&test_app.app, "/api/torrents").await;
    let list = body_json(response).await;
    let hashes: Vec<_> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["infoHash"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(hashes.len(), 2);
    assert_ne!(hashes[0], hashes[1]);
}

#[tokio::test]
async fn failed_fetch_surfaces_as_errored_and_readd_retries() {
    let test_app = seeded_app();
    let unseeded = "magnet:?xt=urn:btih:bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb&dn=Missing";

    let (status, body) = add_torrent(&test_app.app, unseeded).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "adding");

    wait_for_listed_status(&test_app.app, "errored").await;

    // Seed the content and resubmit: same record, fetch restarted.
    test_app.engine.seed(
        unseeded,
        "Missing",
        vec![SimFile::new("missing.mp4", vec![5u8; 128])],
    );
    let (_, body) = add_torrent(&test_app.app, unseeded).await;
    assert_eq!(body["status"], "already_added");

    let record =
        wait_for_status(&test_app.app, "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb", "done").await;
    assert_eq!(record["name"], "Missing");

    // The retry reused the record instead of creating a second one.
    let response = get(&test_app.app, "/api/torrents").await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
}
