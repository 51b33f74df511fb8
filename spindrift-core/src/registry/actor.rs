//! Actor implementation for the content registry.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::commands::RegistryCommand;
use super::core::Registry;
use super::handle::RegistryHandle;
use crate::fetch::FetchEngine;

/// Spawns the registry actor and returns its handle.
///
/// The actor processes commands sequentially, which is what makes the
/// dedup check-and-insert in `add_source` atomic and record mutation
/// torn-read free without per-record locks. Fetch-engine events arrive
/// on a second, unbounded channel so slow HTTP callers can never block
/// telemetry updates.
pub fn spawn_registry(engine: Arc<dyn FetchEngine>) -> RegistryHandle {
    let (sender, receiver) = mpsc::channel(100);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let registry = Registry::new(engine, event_tx);

    tokio::spawn(async move {
        run_actor_loop(registry, receiver, event_rx).await;
    });

    RegistryHandle::new(sender)
}

/// Runs the main actor message processing loop.
async fn run_actor_loop(
    mut registry: Registry,
    mut receiver: mpsc::Receiver<RegistryCommand>,
    mut event_receiver: mpsc::UnboundedReceiver<RegistryCommand>,
) {
    tracing::debug!("registry actor started");

    loop {
        tokio::select! {
            Some(command) = receiver.recv() => {
                if !handle_command(&mut registry, command).await {
                    break;
                }
            }
            Some(command) = event_receiver.recv() => {
                if !handle_command(&mut registry, command).await {
                    break;
                }
            }
            else => break,
        }
    }

    tracing::debug!("registry actor stopped");
}

/// Handles a single command for the registry.
/// Returns true to continue processing, false to shut down.
async fn handle_command(registry: &mut Registry, command: RegistryCommand) -> bool {
    match command {
        RegistryCommand::AddSource { source, responder } => {
            let outcome = registry.add_or_get(source).await;
            let _ = responder.send(outcome);
        }

        RegistryCommand::GetByHash {
            info_hash,
            responder,
        } => {
            let _ = responder.send(registry.record_by_hash(info_hash));
        }

        RegistryCommand::ListRecords { responder } => {
            let _ = responder.send(registry.list_records());
        }

        RegistryCommand::Remove {
            info_hash,
            responder,
        } => {
            let result = registry.remove(info_hash).await;
            let _ = responder.send(result);
        }

        RegistryCommand::ApplyFetchEvent { source, event } => {
            registry.apply_event(&source, event);
        }

        RegistryCommand::Shutdown { responder } => {
            tracing::debug!("registry actor shutting down");
            let _ = responder.send(());
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::FetchConfig;
    use crate::fetch::{InfoHash, SimFetchEngine, SimFile};
    use crate::registry::{RecordState, RegistryError};

    const MAGNET: &str = "magnet:?xt=urn:btih:0123456789abcdef0123456789abcdef01234567&dn=Test";

    fn fast_config() -> FetchConfig {
        FetchConfig {
            metadata_delay: Duration::ZERO,
            progress_interval: Duration::from_millis(1),
            progress_steps: 2,
            ..FetchConfig::default()
        }
    }

    fn seeded_engine(config: FetchConfig) -> Arc<SimFetchEngine> {
        let engine = SimFetchEngine::new(config);
        engine.seed(MAGNET, "Test", vec![SimFile::new("test.mp4", vec![0u8; 256])]);
        Arc::new(engine)
    }

    async fn wait_for_state(
        handle: &RegistryHandle,
        info_hash: InfoHash,
        state: RecordState,
    ) {
        for _ in 0..100 {
            if let Ok(record) = handle.record_by_hash(info_hash).await
                && record.state == state
            {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("record never reached {state:?}");
    }

    #[tokio::test]
    async fn add_creates_placeholder_then_resolves() {
        let handle = spawn_registry(seeded_engine(fast_config()));

        let outcome = handle.add_source(MAGNET).await.unwrap();
        assert!(outcome.newly_added);
        assert_eq!(outcome.record.name, "Loading...");

        let expected = InfoHash::from_hex("0123456789abcdef0123456789abcdef01234567").unwrap();
        wait_for_state(&handle, expected, RecordState::Done).await;

        let record = handle.record_by_hash(expected).await.unwrap();
        assert_eq!(record.name, "Test");
        assert_eq!(record.progress, 1.0);
        assert_eq!(record.files.len(), 1);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_add_returns_same_record() {
        let handle = spawn_registry(seeded_engine(FetchConfig {
            // Long metadata delay keeps the record a placeholder.
            metadata_delay: Duration::from_secs(60),
            ..fast_config()
        }));

        let first = handle.add_source(MAGNET).await.unwrap();
        let second = handle.add_source(MAGNET).await.unwrap();

        assert!(first.newly_added);
        assert!(!second.newly_added);
        assert!(second.record.info_hash.is_none());
        assert_eq!(handle.list_records().await.unwrap().len(), 1);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_adds_create_exactly_one_record() {
        let handle = spawn_registry(seeded_engine(fast_config()));

        let mut joins = Vec::new();
        for _ in 0..16 {
            let handle = handle.clone();
            joins.push(tokio::spawn(
                async move { handle.add_source(MAGNET).await },
            ));
        }

        let mut created = 0;
        for join in joins {
            if join.await.unwrap().unwrap().newly_added {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(handle.list_records().await.unwrap().len(), 1);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn distinct_sources_get_distinct_hashes() {
        let engine = SimFetchEngine::new(fast_config());
        engine.seed("spindrift:a", "A", vec![SimFile::new("a.bin", vec![0u8; 8])]);
        engine.seed("spindrift:b", "B", vec![SimFile::new("b.bin", vec![0u8; 8])]);
        let handle = spawn_registry(Arc::new(engine));

        handle.add_source("spindrift:a").await.unwrap();
        handle.add_source("spindrift:b").await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        let records = handle.list_records().await.unwrap();
        assert_eq!(records.len(), 2);
        let hashes: Vec<_> = records.iter().filter_map(|r| r.info_hash).collect();
        assert_eq!(hashes.len(), 2);
        assert_ne!(hashes[0], hashes[1]);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn unknown_hash_is_not_found() {
        let handle = spawn_registry(seeded_engine(fast_config()));
        let result = handle.record_by_hash(InfoHash::new([9u8; 20])).await;
        assert!(matches!(result, Err(RegistryError::NotFound { .. })));
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn failed_fetch_marks_record_errored_and_retries_on_readd() {
        // Nothing seeded: every fetch fails.
        let engine = Arc::new(SimFetchEngine::new(fast_config()));
        let handle = spawn_registry(engine.clone());

        handle.add_source("spindrift:missing").await.unwrap();
        for _ in 0..100 {
            let records = handle.list_records().await.unwrap();
            if matches!(records[0].state, RecordState::Errored { .. }) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let records = handle.list_records().await.unwrap();
        assert!(matches!(records[0].state, RecordState::Errored { .. }));

        // Seed it and re-add: the fetch restarts in place.
        engine.seed(
            "spindrift:missing",
            "Found",
            vec![SimFile::new("found.bin", vec![1u8; 32])],
        );
        let outcome = handle.add_source("spindrift:missing").await.unwrap();
        assert!(!outcome.newly_added);

        let mut done = false;
        for _ in 0..100 {
            let records = handle.list_records().await.unwrap();
            if records[0].state == RecordState::Done {
                done = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(done, "retried fetch never completed");
        assert_eq!(handle.list_records().await.unwrap().len(), 1);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn remove_deletes_record_and_subsequent_lookups_fail() {
        let handle = spawn_registry(seeded_engine(fast_config()));
        let expected = InfoHash::from_hex("0123456789abcdef0123456789abcdef01234567").unwrap();

        handle.add_source(MAGNET).await.unwrap();
        wait_for_state(&handle, expected, RecordState::Done).await;

        handle.remove(expected).await.unwrap();
        assert!(matches!(
            handle.record_by_hash(expected).await,
            Err(RegistryError::NotFound { .. })
        ));
        assert!(handle.list_records().await.unwrap().is_empty());

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_stops_the_actor() {
        let handle = spawn_registry(seeded_engine(fast_config()));
        assert!(handle.is_running());

        handle.shutdown().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let result = handle.list_records().await;
        assert!(matches!(result, Err(RegistryError::Shutdown)));
    }
}
