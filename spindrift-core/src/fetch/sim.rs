//! In-memory simulation fetch engine.
//!
//! Serves pre-seeded byte content as if it were arriving from a swarm,
//! pacing its event stream according to [`FetchConfig`]. Used by the CLI's
//! serve command for demo content and by every integration test; a real
//! peer-to-peer engine would implement [`FetchEngine`] the same way.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use sha1::{Digest, Sha1};
use tokio::sync::mpsc;

use super::{
    FetchEngine, FetchError, FetchEvent, FetchMetadata, FileMetadata, FileReader, InfoHash,
    TransferStats,
};
use crate::config::FetchConfig;

/// A file seeded into the simulation engine.
#[derive(Debug, Clone)]
pub struct SimFile {
    pub name: String,
    pub path: String,
    pub data: Bytes,
}

impl SimFile {
    /// Creates a seeded file whose relative path equals its name.
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        Self {
            path: name.clone(),
            name,
            data: data.into(),
        }
    }
}

#[derive(Debug)]
struct SeededContent {
    info_hash: InfoHash,
    name: String,
    files: Vec<SimFile>,
}

impl SeededContent {
    fn total_length(&self) -> u64 {
        self.files.iter().map(|f| f.data.len() as u64).sum()
    }

    fn metadata(&self) -> FetchMetadata {
        FetchMetadata {
            info_hash: self.info_hash,
            name: self.name.clone(),
            total_length: self.total_length(),
            files: self
                .files
                .iter()
                .enumerate()
                .map(|(index, f)| FileMetadata {
                    index,
                    name: f.name.clone(),
                    path: f.path.clone(),
                    length: f.data.len() as u64,
                })
                .collect(),
        }
    }
}

/// Fetch engine backed by seeded in-memory content.
///
/// Clones share the same seeded-content map.
#[derive(Clone)]
pub struct SimFetchEngine {
    config: FetchConfig,
    by_source: Arc<RwLock<HashMap<String, Arc<SeededContent>>>>,
    by_hash: Arc<RwLock<HashMap<InfoHash, Arc<SeededContent>>>>,
}

impl SimFetchEngine {
    /// Creates an engine with no seeded content.
    pub fn new(config: FetchConfig) -> Self {
        Self {
            config,
            by_source: Arc::new(RwLock::new(HashMap::new())),
            by_hash: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Seeds content under a source descriptor and returns its info hash.
    ///
    /// The hash is the btih from the descriptor when it is a magnet link
    /// carrying one, otherwise the SHA-1 of the descriptor itself, so that
    /// repeated seeding of the same descriptor is stable.
    pub fn seed(
        &self,
        source: impl Into<String>,
        name: impl Into<String>,
        files: Vec<SimFile>,
    ) -> InfoHash {
        let source = source.into();
        let content = Arc::new(SeededContent {
            info_hash: derive_info_hash(&source),
            name: name.into(),
            files,
        });
        let info_hash = content.info_hash;
        self.by_source.write().insert(source, content);
        info_hash
    }
}

#[async_trait::async_trait]
impl FetchEngine for SimFetchEngine {
    async fn start_fetch(&self, source: &str) -> Result<mpsc::Receiver<FetchEvent>, FetchError> {
        let (tx, rx) = mpsc::channel(16);
        let seeded = self.by_source.read().get(source).cloned();
        let config = self.config.clone();

        match seeded {
            Some(content) => {
                // Readers resolve by hash from the moment the fetch starts.
                self.by_hash.write().insert(content.info_hash, content.clone());
                tokio::spawn(run_fetch(content, config, tx));
            }
            None => {
                let source = source.to_string();
                tokio::spawn(async move {
                    tokio::time::sleep(config.metadata_delay).await;
                    let _ = tx
                        .send(FetchEvent::Failed {
                            reason: format!("no peers found for {source}"),
                        })
                        .await;
                });
            }
        }

        Ok(rx)
    }

    async fn file_reader(
        &self,
        info_hash: InfoHash,
        file_index: usize,
    ) -> Result<Arc<dyn FileReader>, FetchError> {
        let content = self
            .by_hash
            .read()
            .get(&info_hash)
            .cloned()
            .ok_or(FetchError::UnknownContent { info_hash })?;

        let file = content
            .files
            .get(file_index)
            .ok_or(FetchError::FileOutOfBounds {
                index: file_index,
                file_count: content.files.len(),
            })?;

        Ok(Arc::new(SimFileReader {
            data: file.data.clone(),
        }))
    }

    async fn cancel_fetch(&self, info_hash: InfoHash) -> Result<(), FetchError> {
        self.by_hash
            .write()
            .remove(&info_hash)
            .map(|_| ())
            .ok_or(FetchError::UnknownContent { info_hash })
    }
}

/// Emits the event sequence for one seeded fetch.
async fn run_fetch(
    content: Arc<SeededContent>,
    config: FetchConfig,
    tx: mpsc::Sender<FetchEvent>,
) {
    tokio::time::sleep(config.metadata_delay).await;

    if tx.send(FetchEvent::Metadata(content.metadata())).await.is_err() {
        return;
    }

    let steps = config.progress_steps.max(1);
    for step in 1..=steps {
        tokio::time::sleep(config.progress_interval).await;
        let stats = TransferStats {
            progress: f64::from(step) / f64::from(steps),
            download_bps: config.simulated_download_bps,
            upload_bps: config.simulated_download_bps / 8,
            peer_count: config.simulated_peers,
        };
        if tx.send(FetchEvent::Progress(stats)).await.is_err() {
            return;
        }
    }

    let _ = tx.send(FetchEvent::Completed).await;
}

#[derive(Debug)]
struct SimFileReader {
    data: Bytes,
}

#[async_trait::async_trait]
impl FileReader for SimFileReader {
    async fn read_at(&self, offset: u64, length: usize) -> Result<Bytes, FetchError> {
        let file_size = self.data.len() as u64;
        if offset + length as u64 > file_size {
            return Err(FetchError::ReadFailed {
                reason: format!(
                    "read of {length} bytes at {offset} past end of {file_size}-byte file"
                ),
            });
        }
        let start = offset as usize;
        Ok(self.data.slice(start..start + length))
    }

    fn len(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Derives a stable info hash for a source descriptor.
fn derive_info_hash(source: &str) -> InfoHash {
    if let Some(hash) = magnet_info_hash(source) {
        return hash;
    }
    InfoHash::new(Sha1::digest(source.as_bytes()).into())
}

/// Extracts the btih hash from a magnet descriptor, if present and valid.
fn magnet_info_hash(source: &str) -> Option<InfoHash> {
    let magnet = magnet_url::Magnet::new(source).ok()?;
    magnet
        .to_string()
        .split(['?', '&'])
        .find_map(|param| param.strip_prefix("xt=urn:btih:"))
        .and_then(|hex_str| InfoHash::from_hex(hex_str).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_events(mut rx: mpsc::Receiver<FetchEvent>) -> impl Future<Output = Vec<FetchEvent>> {
        async move {
            let mut events = Vec::new();
            while let Some(event) = rx.recv().await {
                events.push(event);
            }
            events
        }
    }

    fn test_engine() -> SimFetchEngine {
        let config = FetchConfig {
            metadata_delay: std::time::Duration::ZERO,
            progress_interval: std::time::Duration::from_millis(1),
            progress_steps: 2,
            ..FetchConfig::default()
        };
        SimFetchEngine::new(config)
    }

    #[tokio::test]
    async fn seeded_fetch_emits_metadata_then_completion() {
        let engine = test_engine();
        let info_hash = engine.seed(
            "magnet:?xt=urn:btih:0123456789abcdef0123456789abcdef01234567",
            "movie",
            vec![SimFile::new("movie.mp4", vec![1u8; 64])],
        );

        let rx = engine.start_fetch("magnet:?xt=urn:btih:0123456789abcdef0123456789abcdef01234567")
            .await
            .unwrap();
        let events = collect_events(rx).await;

        match &events[0] {
            FetchEvent::Metadata(meta) => {
                assert_eq!(meta.info_hash, info_hash);
                assert_eq!(meta.total_length, 64);
                assert_eq!(meta.files.len(), 1);
                assert_eq!(meta.files[0].index, 0);
            }
            other => panic!("expected metadata first, got {other:?}"),
        }
        assert!(matches!(events.last(), Some(FetchEvent::Completed)));
    }

    #[tokio::test]
    async fn unseeded_fetch_fails() {
        let engine = test_engine();
        let rx = engine.start_fetch("magnet:?xt=urn:btih:ffffffffffffffffffffffffffffffffffffffff")
            .await
            .unwrap();
        let events = collect_events(rx).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], FetchEvent::Failed { .. }));
    }

    #[tokio::test]
    async fn file_reader_serves_slices() {
        let engine = test_engine();
        let data: Vec<u8> = (0..100).collect();
        let info_hash = engine.seed("spindrift:test", "data", vec![SimFile::new("data.bin", data)]);
        let _rx = engine.start_fetch("spindrift:test").await.unwrap();

        let reader = engine.file_reader(info_hash, 0).await.unwrap();
        assert_eq!(reader.len(), 100);
        let chunk = reader.read_at(10, 5).await.unwrap();
        assert_eq!(chunk.as_ref(), &[10, 11, 12, 13, 14]);

        let err = reader.read_at(95, 10).await.unwrap_err();
        assert!(matches!(err, FetchError::ReadFailed { .. }));
    }

    #[tokio::test]
    async fn file_reader_rejects_bad_index() {
        let engine = test_engine();
        let info_hash = engine.seed("spindrift:one", "one", vec![SimFile::new("a.bin", vec![0u8; 8])]);
        let _rx = engine.start_fetch("spindrift:one").await.unwrap();

        let err = engine.file_reader(info_hash, 3).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::FileOutOfBounds { index: 3, file_count: 1 }
        ));
    }

    #[test]
    fn magnet_descriptor_hash_comes_from_btih() {
        let hash = derive_info_hash(
            "magnet:?xt=urn:btih:0123456789abcdef0123456789abcdef01234567&dn=Test",
        );
        assert_eq!(hash.to_string(), "0123456789abcdef0123456789abcdef01234567");
    }

    #[test]
    fn non_magnet_descriptor_hash_is_stable() {
        let a = derive_info_hash("spindrift:some-content");
        let b = derive_info_hash("spindrift:some-content");
        let c = derive_info_hash("spindrift:other-content");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
