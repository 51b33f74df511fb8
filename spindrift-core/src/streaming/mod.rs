//! Bounded byte streams over fetch-engine file readers.
//!
//! Turns the random-access [`FileReader`] capability into a chunked,
//! backpressured stream suitable for an HTTP response body. The stream
//! owns its reader: dropping it (client disconnect) releases the
//! capability without touching any other stream over the same file.

use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, stream};

use crate::fetch::FileReader;

/// Size of chunks read from the file reader.
///
/// Balances memory usage against per-read overhead; matches the chunk
/// size HTML5 media elements typically consume per request tick.
pub const RANGE_CHUNK_SIZE: usize = 256 * 1024; // 256 KiB

/// Creates a stream yielding exactly `length` bytes starting at `start`.
///
/// Bytes are pulled from the reader chunk by chunk as the consumer polls,
/// so a transfer that is still arriving feeds the client lazily instead of
/// buffering. Reader failures surface as `std::io::Error` items, which an
/// HTTP body maps to abrupt stream termination.
pub fn range_stream(
    reader: Arc<dyn FileReader>,
    start: u64,
    length: u64,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    stream::unfold(
        (reader, start, start + length),
        |(reader, position, end)| async move {
            if position >= end {
                return None;
            }

            let chunk_size = std::cmp::min(RANGE_CHUNK_SIZE as u64, end - position) as usize;
            match reader.read_at(position, chunk_size).await {
                Ok(bytes) => {
                    let advanced = position + bytes.len() as u64;
                    Some((Ok(bytes), (reader, advanced, end)))
                }
                Err(e) => {
                    tracing::error!("range stream read at {position} failed: {e}");
                    Some((
                        Err(std::io::Error::other(e.to_string())),
                        (reader, end, end),
                    ))
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::fetch::FetchError;

    #[derive(Debug)]
    struct StaticReader {
        data: Bytes,
    }

    #[async_trait::async_trait]
    impl FileReader for StaticReader {
        async fn read_at(&self, offset: u64, length: usize) -> Result<Bytes, FetchError> {
            let start = offset as usize;
            let end = start + length;
            if end > self.data.len() {
                return Err(FetchError::ReadFailed {
                    reason: "past end".to_string(),
                });
            }
            Ok(self.data.slice(start..end))
        }

        fn len(&self) -> u64 {
            self.data.len() as u64
        }
    }

    async fn collect(stream: impl Stream<Item = Result<Bytes, std::io::Error>>) -> Vec<u8> {
        let chunks: Vec<_> = stream.collect().await;
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn yields_exact_requested_window() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let reader = Arc::new(StaticReader {
            data: Bytes::from(data.clone()),
        });

        let body = collect(range_stream(reader, 100, 100)).await;
        assert_eq!(body, &data[100..200]);
    }

    #[tokio::test]
    async fn chunks_large_ranges() {
        let len = RANGE_CHUNK_SIZE * 2 + 17;
        let reader = Arc::new(StaticReader {
            data: Bytes::from(vec![7u8; len]),
        });

        let chunks: Vec<_> = range_stream(reader, 0, len as u64).collect().await;
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].as_ref().unwrap().len(), RANGE_CHUNK_SIZE);
        assert_eq!(chunks[2].as_ref().unwrap().len(), 17);
    }

    #[tokio::test]
    async fn read_failure_ends_stream_with_io_error() {
        let reader = Arc::new(StaticReader {
            data: Bytes::from(vec![0u8; 10]),
        });

        // Window extends past the file; the reader rejects the final read.
        let mut stream = std::pin::pin!(range_stream(reader, 0, 20));
        let first = stream.next().await.unwrap();
        assert!(first.is_err());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn dropping_one_stream_leaves_another_intact() {
        let data = Bytes::from(vec![9u8; 512]);
        let first_reader = Arc::new(StaticReader { data: data.clone() });
        let second_reader = Arc::new(StaticReader { data });

        let mut doomed = Box::pin(range_stream(first_reader, 0, 512));
        let survivor = range_stream(second_reader, 0, 512);

        assert!(doomed.next().await.is_some());
        drop(doomed);

        let body = collect(survivor).await;
        assert_eq!(body.len(), 512);
    }
}
