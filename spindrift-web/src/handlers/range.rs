//! HTTP Range header parsing and validation.
//!
//! Only single byte ranges are supported. Parsing is deliberately
//! forgiving (a malformed header falls back to a full-body 200 at the
//! call site), validation is deliberately strict: a start past the end
//! of the file is a hard 416, never a silent clamp.

use crate::error::ApiError;

/// Parses a `Range` header value into `(start, Option<end>)`.
///
/// `bytes=100-199` → `(100, Some(199))`, `bytes=500-` → `(500, None)`,
/// `bytes=-199` → `(0, Some(199))`. Returns `None` for anything else,
/// including multi-range requests.
pub fn parse_range_header(value: &str) -> Option<(u64, Option<u64>)> {
    let spec = value.strip_prefix("bytes=")?;
    if spec.contains(',') {
        return None;
    }

    let (start_text, end_text) = spec.split_once('-')?;
    let start = if start_text.is_empty() {
        0
    } else {
        start_text.trim().parse().ok()?
    };
    let end = if end_text.is_empty() {
        None
    } else {
        Some(end_text.trim().parse().ok()?)
    };
    Some((start, end))
}

/// Validates a parsed range against the file length.
///
/// A missing end defaults to the last byte and any end past it is
/// clamped. Returns the inclusive `(start, end)` window to serve.
///
/// # Errors
/// - `ApiError::RangeNotSatisfiable` - Start past the end of the file,
///   start beyond end, or a zero-length file
pub fn validate_range(
    start: u64,
    end: Option<u64>,
    total_length: u64,
) -> Result<(u64, u64), ApiError> {
    if total_length == 0 || start >= total_length {
        return Err(ApiError::RangeNotSatisfiable {
            length: total_length,
        });
    }

    let last_byte = total_length - 1;
    let end = end.unwrap_or(last_byte).min(last_byte);
    if start > end {
        return Err(ApiError::RangeNotSatisfiable {
            length: total_length,
        });
    }

    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bounded_range() {
        assert_eq!(parse_range_header("bytes=100-199"), Some((100, Some(199))));
    }

    #[test]
    fn parses_open_ended_range() {
        assert_eq!(parse_range_header("bytes=500-"), Some((500, None)));
    }

    #[test]
    fn parses_missing_start_as_zero() {
        assert_eq!(parse_range_header("bytes=-199"), Some((0, Some(199))));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_range_header("bytes=abc-def"), None);
        assert_eq!(parse_range_header("items=0-10"), None);
        assert_eq!(parse_range_header("bytes=0-10,20-30"), None);
        assert_eq!(parse_range_header("bytes="), None);
    }

    #[test]
    fn validates_in_bounds_range() {
        assert_eq!(validate_range(100, Some(199), 1000).unwrap(), (100, 199));
    }

    #[test]
    fn open_end_defaults_to_last_byte() {
        assert_eq!(validate_range(500, None, 1000).unwrap(), (500, 999));
    }

    #[test]
    fn end_past_file_is_clamped() {
        assert_eq!(validate_range(0, Some(5000), 1000).unwrap(), (0, 999));
    }

    #[test]
    fn start_past_file_is_unsatisfiable() {
        let result = validate_range(1000, None, 1000);
        assert!(matches!(
            result,
            Err(ApiError::RangeNotSatisfiable { length: 1000 })
        ));
    }

    #[test]
    fn inverted_range_is_unsatisfiable() {
        assert!(validate_range(200, Some(100), 1000).is_err());
    }

    #[test]
    fn zero_length_file_is_unsatisfiable() {
        assert!(validate_range(0, None, 0).is_err());
    }
}
