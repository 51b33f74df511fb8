//! Spindrift Web - HTTP gateway for in-flight content
//!
//! Exposes the content registry as a JSON API and serves registered files
//! with single-range byte semantics, so standard media players can seek
//! and play while the underlying transfer is still in progress.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, router, run_server};
