//! Registry state and operations, driven by the actor loop.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::RegistryError;
use super::commands::{AddOutcome, RegistryCommand};
use super::record::{ContentRecord, RecordState};
use crate::fetch::{FetchEngine, FetchEvent, InfoHash};

/// Process-wide map of content records, keyed by source descriptor.
///
/// Only the actor loop touches this struct, so every operation is atomic
/// with respect to every other: the existence check and placeholder insert
/// in [`Registry::add_or_get`] cannot race even under concurrent HTTP
/// callers.
pub struct Registry {
    engine: Arc<dyn FetchEngine>,
    records: HashMap<String, ContentRecord>,
    hash_index: HashMap<InfoHash, String>,
    event_tx: mpsc::UnboundedSender<RegistryCommand>,
}

impl Registry {
    /// Creates an empty registry bound to a fetch engine.
    ///
    /// `event_tx` loops fetch-engine events back into the actor so record
    /// mutation stays on the single writer.
    pub fn new(
        engine: Arc<dyn FetchEngine>,
        event_tx: mpsc::UnboundedSender<RegistryCommand>,
    ) -> Self {
        Self {
            engine,
            records: HashMap::new(),
            hash_index: HashMap::new(),
            event_tx,
        }
    }

    /// Returns the existing record for a descriptor, or creates a
    /// placeholder and starts the fetch.
    ///
    /// Errored records are retried in place rather than returned as-is;
    /// the caller still observes `newly_added == false` for them.
    /// Engine failures never surface here: the record is marked errored
    /// and logged instead.
    pub async fn add_or_get(&mut self, source: String) -> AddOutcome {
        if self.records.contains_key(&source) {
            let errored = matches!(
                self.records[&source].state,
                RecordState::Errored { .. }
            );
            if errored {
                self.restart_fetch(&source).await;
            }
            return AddOutcome {
                record: self.records[&source].clone(),
                newly_added: false,
            };
        }

        self.records
            .insert(source.clone(), ContentRecord::placeholder(source.clone()));
        tracing::info!("registering new content source: {source}");
        self.restart_fetch(&source).await;

        AddOutcome {
            record: self.records[&source].clone(),
            newly_added: true,
        }
    }

    /// Looks up a record by its assigned info hash.
    ///
    /// # Errors
    /// - `RegistryError::NotFound` - No record carries this hash, which
    ///   includes placeholders that have not received one yet
    pub fn record_by_hash(&self, info_hash: InfoHash) -> Result<ContentRecord, RegistryError> {
        self.hash_index
            .get(&info_hash)
            .and_then(|source| self.records.get(source))
            .cloned()
            .ok_or(RegistryError::NotFound { info_hash })
    }

    /// Snapshot of every record, in no particular order.
    pub fn list_records(&self) -> Vec<ContentRecord> {
        self.records.values().cloned().collect()
    }

    /// Removes a record and cancels its fetch.
    ///
    /// Streams already open against the content keep their own readers
    /// and are unaffected.
    ///
    /// # Errors
    /// - `RegistryError::NotFound` - No record carries this hash
    pub async fn remove(&mut self, info_hash: InfoHash) -> Result<(), RegistryError> {
        let source = self
            .hash_index
            .remove(&info_hash)
            .ok_or(RegistryError::NotFound { info_hash })?;
        self.records.remove(&source);

        if let Err(e) = self.engine.cancel_fetch(info_hash).await {
            tracing::warn!("cancel of {info_hash} failed: {e}");
        }
        tracing::info!("removed content {info_hash} ({source})");
        Ok(())
    }

    /// Applies one fetch-engine event to its record.
    pub fn apply_event(&mut self, source: &str, event: FetchEvent) {
        let Some(record) = self.records.get_mut(source) else {
            // Record removed while events were in flight.
            return;
        };

        if let FetchEvent::Metadata(meta) = &event {
            self.hash_index.insert(meta.info_hash, source.to_string());
        }
        record.apply_event(event);
    }

    /// Starts (or restarts) the engine fetch for a known record and wires
    /// its event stream back into the actor. Listener registration is a
    /// one-time action per fetch attempt.
    async fn restart_fetch(&mut self, source: &str) {
        let Some(record) = self.records.get_mut(source) else {
            return;
        };

        if matches!(record.state, RecordState::Errored { .. }) {
            tracing::info!("retrying errored fetch for {source}");
            record.reset_for_retry();
        }

        match self.engine.start_fetch(source).await {
            Ok(events) => {
                record.mark_fetch_started();
                self.spawn_event_forwarder(source.to_string(), events);
            }
            Err(e) => {
                tracing::warn!("engine rejected fetch for {source}: {e}");
                record.apply_event(FetchEvent::Failed {
                    reason: e.to_string(),
                });
            }
        }
    }

    fn spawn_event_forwarder(&self, source: String, mut events: mpsc::Receiver<FetchEvent>) {
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let cmd = RegistryCommand::ApplyFetchEvent {
                    source: source.clone(),
                    event,
                };
                if tx.send(cmd).is_err() {
                    break;
                }
            }
        });
    }
}
