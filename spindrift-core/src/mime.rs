//! MIME type resolution for streamed files.

/// Maps a file name's extension to a content-type string.
///
/// Unmapped or missing extensions fall back to `application/octet-stream`,
/// which HTML5 media elements treat as an opaque download.
pub fn content_type_for(file_name: &str) -> &'static str {
    mime_guess::from_path(file_name)
        .first_raw()
        .unwrap_or("application/octet-stream")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_media_extensions_resolve() {
        assert_eq!(content_type_for("movie.mp4"), "video/mp4");
        assert_eq!(content_type_for("clip.webm"), "video/webm");
        assert_eq!(content_type_for("song.mp3"), "audio/mpeg");
    }

    #[test]
    fn extension_case_is_ignored() {
        assert_eq!(content_type_for("MOVIE.MP4"), "video/mp4");
    }

    #[test]
    fn unknown_extension_falls_back_to_octet_stream() {
        assert_eq!(content_type_for("payload.xyzzy"), "application/octet-stream");
        assert_eq!(content_type_for("no_extension"), "application/octet-stream");
    }
}
