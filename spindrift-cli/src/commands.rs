//! CLI command implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use sha1::{Digest, Sha1};
use spindrift_core::config::SpindriftConfig;
use spindrift_core::fetch::{InfoHash, SimFetchEngine, SimFile};
use spindrift_core::tracing_setup::init_tracing;
use spindrift_web::run_server;

/// Arguments for the `serve` command.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Host address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// TCP port, overriding the PORT environment variable
    #[arg(long)]
    pub port: Option<u16>,

    /// Console log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Directory whose files are seeded into the simulation engine as
    /// streamable demo content
    #[arg(long)]
    pub seed_dir: Option<PathBuf>,

    /// Directory for the run log file (console only when unset)
    #[arg(long)]
    pub logs_dir: Option<PathBuf>,
}

/// Runs the HTTP gateway until interrupted.
pub async fn serve(args: ServeArgs) -> Result<()> {
    let level: tracing::Level = args
        .log_level
        .parse()
        .with_context(|| format!("invalid log level: {}", args.log_level))?;
    init_tracing(level, args.logs_dir.as_deref()).context("failed to initialize tracing")?;

    let mut config = SpindriftConfig::from_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let engine = SimFetchEngine::new(config.fetch.clone());
    if let Some(dir) = args.seed_dir.as_deref() {
        seed_directory(&engine, dir)?;
    }

    run_server(config, Arc::new(engine))
        .await
        .map_err(|e| anyhow::anyhow!("server error: {e}"))
}

/// Seeds every regular file in `dir` as a single-file content set and
/// logs the magnet descriptor to submit for each.
fn seed_directory(engine: &SimFetchEngine, dir: &Path) -> Result<()> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("cannot read seed directory {}", dir.display()))?;

    let mut seeded = 0usize;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let data = std::fs::read(&path)
            .with_context(|| format!("cannot read seed file {}", path.display()))?;

        let info_hash = InfoHash::new(Sha1::digest(&data).into());
        let source = format!(
            "magnet:?xt=urn:btih:{info_hash}&dn={}",
            magnet_safe_name(&name)
        );
        engine.seed(source.clone(), name.clone(), vec![SimFile::new(name.clone(), data)]);
        tracing::info!("seeded {name} ({info_hash}): {source}");
        seeded += 1;
    }

    tracing::info!("seeded {seeded} file(s) from {}", dir.display());
    Ok(())
}

/// Display-name sanitizer for generated magnet descriptors.
fn magnet_safe_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnet_names_are_url_safe() {
        assert_eq!(magnet_safe_name("Big Movie (2024).mp4"), "Big_Movie__2024_.mp4");
        assert_eq!(magnet_safe_name("plain.mkv"), "plain.mkv");
    }
}
