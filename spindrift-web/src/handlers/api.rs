//! JSON API handlers for the content registry.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use spindrift_core::InfoHash;
use spindrift_core::registry::ContentRecord;

use crate::error::ApiError;
use crate::server::AppState;

/// Request body for adding content by magnet descriptor.
#[derive(Debug, Deserialize)]
pub struct AddTorrentRequest {
    #[serde(rename = "magnetURI")]
    pub magnet_uri: Option<String>,
}

/// `POST /api/add-torrent`
///
/// Deduplicating add. A first submission answers immediately with a
/// `"adding"` placeholder (`infoHash` stays null until metadata
/// resolves); a resubmission answers `"already_added"` with the current
/// record, restarting the fetch when it had errored.
pub async fn add_torrent(
    State(state): State<AppState>,
    Json(request): Json<AddTorrentRequest>,
) -> Result<Json<Value>, ApiError> {
    let source = request
        .magnet_uri
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::MissingParameter { name: "magnetURI" })?;

    let outcome = state.registry.add_source(source).await?;
    let status = if outcome.newly_added {
        "adding"
    } else {
        "already_added"
    };

    Ok(Json(json!({
        "infoHash": outcome.record.info_hash,
        "name": outcome.record.name,
        "status": status,
    })))
}

/// `GET /api/torrent/{info_hash}`
pub async fn torrent_status(
    State(state): State<AppState>,
    Path(info_hash): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let info_hash = parse_info_hash(&info_hash)?;
    let record = state.registry.record_by_hash(info_hash).await?;
    Ok(Json(record_projection(&record)))
}

/// `GET /api/torrents`
pub async fn list_torrents(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let records = state.registry.list_records().await?;
    Ok(Json(Value::Array(
        records.iter().map(record_projection).collect(),
    )))
}

/// `DELETE /api/torrent/{info_hash}`
///
/// Removes the record and cancels its fetch. Streams already open on the
/// content run to completion on their own readers.
pub async fn remove_torrent(
    State(state): State<AppState>,
    Path(info_hash): Path<String>,
) -> Result<StatusCode, ApiError> {
    let info_hash = parse_info_hash(&info_hash)?;
    state.registry.remove(info_hash).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let records = state.registry.list_records().await?;
    Ok(Json(json!({
        "status": "ok",
        "uptimeSecs": state.started_at.elapsed().as_secs(),
        "torrents": records.len(),
    })))
}

/// Parses a path segment as a hex info hash.
pub(crate) fn parse_info_hash(raw: &str) -> Result<InfoHash, ApiError> {
    InfoHash::from_hex(raw).map_err(|_| ApiError::InvalidInfoHash {
        value: raw.to_string(),
    })
}

/// The client-facing projection of a record.
///
/// Field names follow the JSON API contract, not the internal record.
fn record_projection(record: &ContentRecord) -> Value {
    json!({
        "infoHash": record.info_hash,
        "name": record.name,
        "length": record.total_length,
        "progress": record.progress,
        "downloadSpeed": record.download_bps,
        "uploadSpeed": record.upload_bps,
        "numPeers": record.peer_count,
        "status": record.state.label(),
        "files": record.files.iter().map(|file| json!({
            "name": file.name,
            "length": file.length,
            "path": file.path,
            "index": file.index,
        })).collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_hash_parsing_rejects_bad_input() {
        assert!(parse_info_hash("0123456789abcdef0123456789abcdef01234567").is_ok());
        assert!(matches!(
            parse_info_hash("not-a-hash"),
            Err(ApiError::InvalidInfoHash { .. })
        ));
    }

    #[test]
    fn projection_uses_api_field_names() {
        let mut record = ContentRecord::placeholder("magnet:?xt=x".to_string());
        record.total_length = 42;
        let value = record_projection(&record);

        assert!(value["infoHash"].is_null());
        assert_eq!(value["name"], "Loading...");
        assert_eq!(value["length"], 42);
        assert_eq!(value["status"], "adding");
        assert_eq!(value["files"], json!([]));
    }
}
