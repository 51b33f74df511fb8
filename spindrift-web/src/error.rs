//! API error type and its HTTP response mapping.

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use spindrift_core::RegistryError;

/// Errors surfaced by API handlers.
///
/// Every variant maps to a status code and a JSON `{"error": ...}` body.
/// The three registry 404 causes keep distinct messages so clients can
/// tell an unknown torrent from pending metadata from a bad file index.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing required parameter: {name}")]
    MissingParameter { name: &'static str },

    #[error("Invalid info hash: {value}")]
    InvalidInfoHash { value: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Requested range not satisfiable")]
    RangeNotSatisfiable { length: u64 },

    #[error("Upstream read failed: {reason}")]
    Upstream { reason: String },
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParameter { .. } | ApiError::InvalidInfoHash { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Registry(
                RegistryError::NotFound { .. }
                | RegistryError::FilesNotReady
                | RegistryError::FileNotFound { .. },
            ) => StatusCode::NOT_FOUND,
            ApiError::Registry(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            ApiError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Registry(RegistryError::NotFound { .. }) => "Torrent not found".to_string(),
            ApiError::Registry(RegistryError::FilesNotReady) => "Files not ready yet".to_string(),
            ApiError::Registry(RegistryError::FileNotFound { .. }) => "File not found".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {self}");
        }
        let body = Json(json!({ "error": self.message() }));

        // 416 carries the file length so clients can reissue a valid range.
        if let ApiError::RangeNotSatisfiable { length } = self {
            return (
                status,
                [(header::CONTENT_RANGE, format!("bytes */{length}"))],
                body,
            )
                .into_response();
        }

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spindrift_core::InfoHash;

    #[test]
    fn registry_not_found_maps_to_404_with_message() {
        let error = ApiError::Registry(RegistryError::NotFound {
            info_hash: InfoHash::new([0u8; 20]),
        });
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
        assert_eq!(error.message(), "Torrent not found");
    }

    #[test]
    fn the_three_404_causes_have_distinct_messages() {
        let not_found = ApiError::Registry(RegistryError::NotFound {
            info_hash: InfoHash::new([0u8; 20]),
        });
        let not_ready = ApiError::Registry(RegistryError::FilesNotReady);
        let bad_index = ApiError::Registry(RegistryError::FileNotFound {
            index: 7,
            file_count: 2,
        });

        let messages = [not_found.message(), not_ready.message(), bad_index.message()];
        assert_eq!(
            messages.iter().collect::<std::collections::HashSet<_>>().len(),
            3
        );
    }

    #[test]
    fn unsatisfiable_range_response_names_the_length() {
        let response = ApiError::RangeNotSatisfiable { length: 1000 }.into_response();
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(
            response.headers().get(header::CONTENT_RANGE).unwrap(),
            "bytes */1000"
        );
    }

    #[test]
    fn shutdown_is_a_server_error() {
        let error = ApiError::Registry(RegistryError::Shutdown);
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
