//! Registry record types and their mutation rules.

use crate::fetch::{FetchEvent, FileMetadata, InfoHash};
use crate::registry::RegistryError;

/// Lifecycle of a content record.
///
/// Progresses `Adding → MetadataPending → Active → Done` and never
/// regresses, with `Errored` as the only terminal exception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordState {
    /// Placeholder created, fetch not yet acknowledged by the engine
    Adding,
    /// Engine accepted the fetch, metadata not yet resolved
    MetadataPending,
    /// Metadata resolved, transfer in progress
    Active,
    /// Transfer complete
    Done,
    /// Fetch failed; re-adding the descriptor restarts it
    Errored { reason: String },
}

impl RecordState {
    fn rank(&self) -> u8 {
        match self {
            RecordState::Adding => 0,
            RecordState::MetadataPending => 1,
            RecordState::Active => 2,
            RecordState::Done => 3,
            RecordState::Errored { .. } => 4,
        }
    }

    /// Status label used in API projections.
    pub fn label(&self) -> &'static str {
        match self {
            RecordState::Adding => "adding",
            RecordState::MetadataPending => "metadata",
            RecordState::Active => "active",
            RecordState::Done => "done",
            RecordState::Errored { .. } => "errored",
        }
    }
}

/// One record per unique source descriptor.
///
/// Owned exclusively by the registry actor; everything handed out is a
/// clone, so readers can never observe a half-applied update.
#[derive(Debug, Clone)]
pub struct ContentRecord {
    /// Assigned once by the fetch engine when metadata resolves
    pub info_hash: Option<InfoHash>,
    /// Deduplication key, immutable after creation
    pub source: String,
    /// Human-readable name, placeholder until metadata resolves
    pub name: String,
    /// Total byte length across the file set
    pub total_length: u64,
    /// Completion fraction in `[0, 1]`
    pub progress: f64,
    /// Download rate in bytes per second
    pub download_bps: u64,
    /// Upload rate in bytes per second
    pub upload_bps: u64,
    /// Connected peer count
    pub peer_count: u32,
    /// Ordered file set, empty until metadata resolves
    pub files: Vec<FileMetadata>,
    pub state: RecordState,
}

impl ContentRecord {
    /// Display name used before metadata resolves.
    pub const PLACEHOLDER_NAME: &'static str = "Loading...";

    /// Creates the placeholder record for a newly seen descriptor.
    pub fn placeholder(source: String) -> Self {
        Self {
            info_hash: None,
            source,
            name: Self::PLACEHOLDER_NAME.to_string(),
            total_length: 0,
            progress: 0.0,
            download_bps: 0,
            upload_bps: 0,
            peer_count: 0,
            files: Vec::new(),
            state: RecordState::Adding,
        }
    }

    /// Applies one fetch-engine event.
    ///
    /// Telemetry fields are overwritten wholesale; the info hash is
    /// assigned at most once; the lifecycle state never moves backward
    /// except into `Errored`.
    pub fn apply_event(&mut self, event: FetchEvent) {
        match event {
            FetchEvent::Metadata(meta) => {
                if self.info_hash.is_none() {
                    self.info_hash = Some(meta.info_hash);
                }
                self.name = meta.name;
                self.total_length = meta.total_length;
                let mut files = meta.files;
                for (i, file) in files.iter_mut().enumerate() {
                    file.index = i;
                }
                self.files = files;
                self.advance(RecordState::Active);
            }
            FetchEvent::Progress(stats) => {
                if self.state == RecordState::Done {
                    return;
                }
                self.progress = stats.progress.clamp(0.0, 1.0);
                self.download_bps = stats.download_bps;
                self.upload_bps = stats.upload_bps;
                self.peer_count = stats.peer_count;
            }
            FetchEvent::Completed => {
                self.progress = 1.0;
                self.download_bps = 0;
                self.advance(RecordState::Done);
            }
            FetchEvent::Failed { reason } => {
                tracing::warn!("fetch for {} failed: {reason}", self.source);
                self.state = RecordState::Errored { reason };
            }
        }
    }

    /// Marks the fetch as acknowledged by the engine.
    pub fn mark_fetch_started(&mut self) {
        self.advance(RecordState::MetadataPending);
    }

    /// Resets an errored record for an in-place retry.
    ///
    /// The assigned info hash, if any, is kept so existing links stay
    /// valid; telemetry and the file list start over.
    pub fn reset_for_retry(&mut self) {
        self.name = Self::PLACEHOLDER_NAME.to_string();
        self.total_length = 0;
        self.progress = 0.0;
        self.download_bps = 0;
        self.upload_bps = 0;
        self.peer_count = 0;
        self.files.clear();
        self.state = RecordState::Adding;
    }

    /// Resolves a file by index, distinguishing "not ready" from "no
    /// such file" so clients can tell the two 404 causes apart.
    ///
    /// # Errors
    /// - `RegistryError::FilesNotReady` - Metadata has not resolved yet
    /// - `RegistryError::FileNotFound` - Index past the file list
    pub fn file_entry(&self, index: usize) -> Result<&FileMetadata, RegistryError> {
        if self.files.is_empty() {
            return Err(RegistryError::FilesNotReady);
        }
        self.files.get(index).ok_or(RegistryError::FileNotFound {
            index,
            file_count: self.files.len(),
        })
    }

    fn advance(&mut self, next: RecordState) {
        if next.rank() > self.state.rank() && !matches!(self.state, RecordState::Errored { .. }) {
            self.state = next;
        }
    }
}
