//! Command definitions for the registry actor model.

use tokio::sync::oneshot;

use super::RegistryError;
use super::record::ContentRecord;
use crate::fetch::{FetchEvent, InfoHash};

/// Commands that can be sent to the registry actor.
///
/// Each command encapsulates an operation request along with a response
/// channel for the actor to send back results. Message passing gives the
/// record map single-writer semantics without any locks.
pub enum RegistryCommand {
    /// Deduplicating add: returns the existing record or creates a
    /// placeholder and begins fetching.
    AddSource {
        source: String,
        responder: oneshot::Sender<AddOutcome>,
    },
    /// Look up a record by its assigned info hash.
    GetByHash {
        info_hash: InfoHash,
        responder: oneshot::Sender<Result<ContentRecord, RegistryError>>,
    },
    /// Snapshot of every record.
    ListRecords {
        responder: oneshot::Sender<Vec<ContentRecord>>,
    },
    /// Remove a record and cancel its fetch.
    Remove {
        info_hash: InfoHash,
        responder: oneshot::Sender<Result<(), RegistryError>>,
    },
    /// Internal: apply one fetch-engine event to a record.
    ApplyFetchEvent { source: String, event: FetchEvent },
    /// Shut down the registry actor gracefully.
    Shutdown { responder: oneshot::Sender<()> },
}

/// Result of an `AddSource` command.
#[derive(Debug, Clone)]
pub struct AddOutcome {
    /// Snapshot of the record at the time of the call
    pub record: ContentRecord,
    /// True when this call created the record
    pub newly_added: bool,
}
