//! Spindrift Core - content registry and range streaming primitives
//!
//! This crate provides the building blocks for exposing in-flight
//! peer-to-peer downloads as HTTP-streamable files: the fetch-engine
//! abstraction, the content registry actor, bounded range streams, and
//! configuration management.

pub mod config;
pub mod fetch;
pub mod mime;
pub mod registry;
pub mod streaming;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::SpindriftConfig;
pub use fetch::{FetchEngine, FetchError, FileReader, InfoHash};
pub use registry::{RegistryError, RegistryHandle, spawn_registry};

/// Core errors that can bubble up from any Spindrift subsystem.
#[derive(Debug, thiserror::Error)]
pub enum SpindriftError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SpindriftError>;
