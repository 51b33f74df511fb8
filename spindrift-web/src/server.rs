//! Router construction and server entry point.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::routing::{get, post};
use spindrift_core::SpindriftConfig;
use spindrift_core::fetch::FetchEngine;
use spindrift_core::registry::{RegistryHandle, spawn_registry};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::handlers::{
    add_torrent, health, list_torrents, remove_torrent, stream_file, torrent_status,
};

/// Shared state for all request handlers.
///
/// The engine sits here alongside the registry handle because the
/// streaming path resolves reader capabilities directly from the engine;
/// only record bookkeeping goes through the registry actor.
#[derive(Clone)]
pub struct AppState {
    pub registry: RegistryHandle,
    pub engine: Arc<dyn FetchEngine>,
    pub started_at: Instant,
}

/// Builds the API router over the given state.
///
/// Separate from [`run_server`] so tests can drive the router in-process
/// without binding a socket.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/add-torrent", post(add_torrent))
        .route("/api/torrents", get(list_torrents))
        .route(
            "/api/torrent/{info_hash}",
            get(torrent_status).delete(remove_torrent),
        )
        .route("/api/stream/{info_hash}/{file_index}", get(stream_file))
        .route("/api/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Spawns the registry, binds the listener, and serves until shutdown.
///
/// Static client assets are served from `config.server.static_dir` for
/// every path the API does not claim.
pub async fn run_server(
    config: SpindriftConfig,
    engine: Arc<dyn FetchEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = spawn_registry(engine.clone());
    let state = AppState {
        registry,
        engine,
        started_at: Instant::now(),
    };

    let app = router(state).fallback_service(ServeDir::new(&config.server.static_dir));

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("spindrift server listening on http://{address}");

    axum::serve(listener, app).await?;
    Ok(())
}
