//! Fetch-engine abstraction.
//!
//! The actual peer-to-peer transfer lives behind the [`FetchEngine`] trait:
//! the registry hands it a source descriptor and receives an asynchronous
//! event stream plus per-file random-access byte readers. This keeps the
//! registry and the stream server entirely decoupled from wire-protocol
//! details.

pub mod sim;

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

pub use sim::{SimFetchEngine, SimFile};

/// SHA-1 hash identifying a unique piece of content.
///
/// Assigned by the fetch engine once metadata for a source descriptor has
/// resolved. Until then, records can only be found via their descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InfoHash([u8; 20]);

impl InfoHash {
    /// Creates an InfoHash from a 20-byte SHA-1 hash.
    pub fn new(hash: [u8; 20]) -> Self {
        Self(hash)
    }

    /// Parses a 40-character lowercase or uppercase hex string.
    ///
    /// # Errors
    /// - `FetchError::InvalidDescriptor` - Not valid 20-byte hex
    pub fn from_hex(hex_str: &str) -> Result<Self, FetchError> {
        let bytes = hex::decode(hex_str).map_err(|_| FetchError::InvalidDescriptor {
            reason: format!("invalid hex info hash: {hex_str}"),
        })?;
        let hash: [u8; 20] = bytes.try_into().map_err(|_| FetchError::InvalidDescriptor {
            reason: format!("info hash must be 20 bytes: {hex_str}"),
        })?;
        Ok(Self(hash))
    }

    /// Returns a reference to the underlying 20-byte hash.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl serde::Serialize for InfoHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single logical file within a fetched content set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Position within the content's ordered file list
    pub index: usize,
    /// File name, used for MIME resolution
    pub name: String,
    /// Path relative to the content root
    pub path: String,
    /// Total byte length of the file
    pub length: u64,
}

/// Metadata for a content set, emitted once per fetch.
#[derive(Debug, Clone)]
pub struct FetchMetadata {
    pub info_hash: InfoHash,
    pub name: String,
    pub total_length: u64,
    pub files: Vec<FileMetadata>,
}

/// Transfer telemetry, overwritten wholesale on every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferStats {
    /// Completion fraction in `[0, 1]`
    pub progress: f64,
    /// Download rate in bytes per second
    pub download_bps: u64,
    /// Upload rate in bytes per second
    pub upload_bps: u64,
    /// Number of connected peers
    pub peer_count: u32,
}

/// Events a fetch engine emits for a single source descriptor.
///
/// `Metadata` arrives at most once and always before `Progress` or
/// `Completed`. `Failed` is terminal.
#[derive(Debug, Clone)]
pub enum FetchEvent {
    Metadata(FetchMetadata),
    Progress(TransferStats),
    Completed,
    Failed { reason: String },
}

/// The seam between Spindrift and the peer-to-peer transfer machinery.
///
/// Implementations own the authoritative byte content; Spindrift only
/// caches their self-reported telemetry in registry records.
#[async_trait::async_trait]
pub trait FetchEngine: Send + Sync {
    /// Begins (or re-joins) fetching the given source descriptor.
    ///
    /// Returns the event stream for this fetch. The engine emits events
    /// lazily as the transfer progresses; the channel closes when the fetch
    /// reaches a terminal state.
    ///
    /// # Errors
    /// - `FetchError::InvalidDescriptor` - Descriptor cannot be interpreted
    /// - `FetchError::EngineShutdown` - Engine no longer accepts fetches
    async fn start_fetch(&self, source: &str) -> Result<mpsc::Receiver<FetchEvent>, FetchError>;

    /// Opens a live random-access byte reader for one file of a fetch.
    ///
    /// Callers re-resolve the reader on every request rather than holding
    /// one across requests; an open reader stays valid even if the content
    /// is later removed from the engine.
    ///
    /// # Errors
    /// - `FetchError::UnknownContent` - No fetch with this info hash
    /// - `FetchError::FileOutOfBounds` - File index past the file list
    async fn file_reader(
        &self,
        info_hash: InfoHash,
        file_index: usize,
    ) -> Result<Arc<dyn FileReader>, FetchError>;

    /// Cancels the transfer for the given content.
    ///
    /// Readers already opened against the content are unaffected.
    ///
    /// # Errors
    /// - `FetchError::UnknownContent` - No fetch with this info hash
    async fn cancel_fetch(&self, info_hash: InfoHash) -> Result<(), FetchError>;
}

/// Random-access byte reads over a single file of a fetch.
///
/// Reads may complete lazily: when the requested bytes have not arrived
/// yet, implementations block the caller (not the runtime) until they do,
/// or fail with `ReadFailed` if they never can.
#[async_trait::async_trait]
pub trait FileReader: Send + Sync + std::fmt::Debug {
    /// Reads up to `length` bytes starting at `offset`.
    ///
    /// # Errors
    /// - `FetchError::ReadFailed` - The range cannot be served
    async fn read_at(&self, offset: u64, length: usize) -> Result<Bytes, FetchError>;

    /// Total byte length of the file.
    fn len(&self) -> u64;

    /// Returns true for zero-length files.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Errors that can occur at the fetch-engine seam.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid source descriptor: {reason}")]
    InvalidDescriptor { reason: String },

    #[error("Unknown content: {info_hash}")]
    UnknownContent { info_hash: InfoHash },

    #[error("File index {index} out of bounds ({file_count} files)")]
    FileOutOfBounds { index: usize, file_count: usize },

    #[error("Read failed: {reason}")]
    ReadFailed { reason: String },

    #[error("Fetch engine shut down")]
    EngineShutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_hash_hex_round_trip() {
        let hex = "0123456789abcdef0123456789abcdef01234567";
        let hash = InfoHash::from_hex(hex).unwrap();
        assert_eq!(hash.to_string(), hex);
    }

    #[test]
    fn info_hash_rejects_wrong_length() {
        assert!(InfoHash::from_hex("0123").is_err());
        assert!(InfoHash::from_hex("").is_err());
    }

    #[test]
    fn info_hash_rejects_non_hex() {
        let result = InfoHash::from_hex("zz23456789abcdef0123456789abcdef01234567");
        assert!(matches!(
            result,
            Err(FetchError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn info_hash_serializes_as_hex_string() {
        let hash = InfoHash::new([0xab; 20]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(20)));
    }
}
