//! Content registry.
//!
//! The registry is the authoritative map from source descriptors to
//! [`ContentRecord`]s. It runs as a single actor task: HTTP handlers talk
//! to it through a cloneable [`RegistryHandle`], and fetch-engine events
//! loop back in on a second channel, so the record map has exactly one
//! writer and needs no locks.

pub mod actor;
pub mod commands;
pub mod core;
pub mod handle;
pub mod record;

pub use actor::spawn_registry;
pub use commands::AddOutcome;
pub use handle::RegistryHandle;
pub use record::{ContentRecord, RecordState};

use crate::fetch::{FetchError, InfoHash};

/// Errors surfaced by registry operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    #[error("Torrent {info_hash} not found")]
    NotFound { info_hash: InfoHash },

    #[error("Files not ready yet")]
    FilesNotReady,

    #[error("File index {index} out of bounds ({file_count} files)")]
    FileNotFound { index: usize, file_count: usize },

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Registry is shut down")]
    Shutdown,
}
