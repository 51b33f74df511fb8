//! Integration tests for Spindrift.
//!
//! Every test drives the real axum router in-process over a seeded
//! simulation fetch engine, exercising the same request paths a media
//! player would.

#[path = "integration/support.rs"]
mod support;

#[path = "integration/http_api.rs"]
mod http_api;

#[path = "integration/registry_flow.rs"]
mod registry_flow;

#[path = "integration/streaming.rs"]
mod streaming;
