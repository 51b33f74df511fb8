//! Range-aware file streaming handler.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::Response;
use spindrift_core::mime::content_type_for;
use spindrift_core::streaming::range_stream;

use super::api::parse_info_hash;
use super::range::{parse_range_header, validate_range};
use crate::error::ApiError;
use crate::server::AppState;

/// `GET /api/stream/{info_hash}/{file_index}`
///
/// Serves one file of a registered content set, honoring a single HTTP
/// byte range. The reader capability is re-resolved on every request and
/// travels inside the body stream, so a client disconnect releases
/// exactly this request's reader and nothing else. A malformed `Range`
/// header degrades to a full-body 200; an out-of-bounds one is a 416.
pub async fn stream_file(
    State(state): State<AppState>,
    Path((info_hash, file_index)): Path<(String, usize)>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let info_hash = parse_info_hash(&info_hash)?;
    let record = state.registry.record_by_hash(info_hash).await?;
    let file = record.file_entry(file_index)?.clone();
    let content_type = content_type_for(&file.name);

    let reader = state
        .engine
        .file_reader(info_hash, file_index)
        .await
        .map_err(|e| ApiError::Upstream {
            reason: e.to_string(),
        })?;

    let requested = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_range_header);

    let total_length = file.length;
    let response = match requested {
        None => {
            tracing::debug!("streaming {info_hash}/{file_index} in full ({total_length} bytes)");
            response_base(content_type)
                .status(StatusCode::OK)
                .header(header::CONTENT_LENGTH, total_length)
                .body(Body::from_stream(range_stream(reader, 0, total_length)))
        }
        Some((start, end)) => {
            let (start, end) = validate_range(start, end, total_length)?;
            let window = end - start + 1;
            tracing::debug!(
                "streaming {info_hash}/{file_index} range {start}-{end}/{total_length}"
            );
            response_base(content_type)
                .status(StatusCode::PARTIAL_CONTENT)
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {start}-{end}/{total_length}"),
                )
                .header(header::CONTENT_LENGTH, window)
                .body(Body::from_stream(range_stream(reader, start, window)))
        }
    };

    response.map_err(|e| ApiError::Upstream {
        reason: e.to_string(),
    })
}

/// Headers shared by full and partial responses.
///
/// `no-cache` because the bytes behind a URL change while the transfer
/// is in flight; `inline` so browsers play instead of download.
fn response_base(content_type: &'static str) -> axum::http::response::Builder {
    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONTENT_DISPOSITION, "inline")
}
