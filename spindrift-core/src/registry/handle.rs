//! Handle for communicating with the registry actor.

use tokio::sync::{mpsc, oneshot};

use super::RegistryError;
use super::commands::{AddOutcome, RegistryCommand};
use super::record::ContentRecord;
use crate::fetch::InfoHash;

/// Handle for communicating with the registry actor.
///
/// Provides an ergonomic async API for sending commands to the registry.
/// Cheap to clone and safe to share across tasks; every method maps a
/// closed channel to `RegistryError::Shutdown`.
#[derive(Clone)]
pub struct RegistryHandle {
    sender: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    /// Creates a new handle with the given command sender.
    pub fn new(sender: mpsc::Sender<RegistryCommand>) -> Self {
        Self { sender }
    }

    /// Adds a source descriptor, deduplicating against existing records.
    ///
    /// Returns immediately with a placeholder record on first submission;
    /// metadata resolves asynchronously and callers poll the record for it.
    ///
    /// # Errors
    /// - `RegistryError::Shutdown` - Registry actor is no longer running
    pub async fn add_source(&self, source: &str) -> Result<AddOutcome, RegistryError> {
        let (responder, rx) = oneshot::channel();
        let cmd = RegistryCommand::AddSource {
            source: source.to_string(),
            responder,
        };

        self.sender
            .send(cmd)
            .await
            .map_err(|_| RegistryError::Shutdown)?;

        rx.await.map_err(|_| RegistryError::Shutdown)
    }

    /// Looks up a record by its assigned info hash.
    ///
    /// # Errors
    /// - `RegistryError::NotFound` - No record carries this hash
    /// - `RegistryError::Shutdown` - Registry actor is no longer running
    pub async fn record_by_hash(
        &self,
        info_hash: InfoHash,
    ) -> Result<ContentRecord, RegistryError> {
        let (responder, rx) = oneshot::channel();
        let cmd = RegistryCommand::GetByHash {
            info_hash,
            responder,
        };

        self.sender
            .send(cmd)
            .await
            .map_err(|_| RegistryError::Shutdown)?;

        rx.await.map_err(|_| RegistryError::Shutdown)?
    }

    /// Returns a snapshot of every record.
    ///
    /// # Errors
    /// - `RegistryError::Shutdown` - Registry actor is no longer running
    pub async fn list_records(&self) -> Result<Vec<ContentRecord>, RegistryError> {
        let (responder, rx) = oneshot::channel();
        let cmd = RegistryCommand::ListRecords { responder };

        self.sender
            .send(cmd)
            .await
            .map_err(|_| RegistryError::Shutdown)?;

        rx.await.map_err(|_| RegistryError::Shutdown)
    }

    /// Removes a record and cancels its fetch.
    ///
    /// # Errors
    /// - `RegistryError::NotFound` - No record carries this hash
    /// - `RegistryError::Shutdown` - Registry actor is no longer running
    pub async fn remove(&self, info_hash: InfoHash) -> Result<(), RegistryError> {
        let (responder, rx) = oneshot::channel();
        let cmd = RegistryCommand::Remove {
            info_hash,
            responder,
        };

        self.sender
            .send(cmd)
            .await
            .map_err(|_| RegistryError::Shutdown)?;

        rx.await.map_err(|_| RegistryError::Shutdown)?
    }

    /// Shuts down the registry actor gracefully.
    ///
    /// # Errors
    /// - `RegistryError::Shutdown` - Registry actor already stopped
    pub async fn shutdown(&self) -> Result<(), RegistryError> {
        let (responder, rx) = oneshot::channel();
        let cmd = RegistryCommand::Shutdown { responder };

        self.sender
            .send(cmd)
            .await
            .map_err(|_| RegistryError::Shutdown)?;

        rx.await.map_err(|_| RegistryError::Shutdown)
    }

    /// Checks if the registry actor is still running.
    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }
}
