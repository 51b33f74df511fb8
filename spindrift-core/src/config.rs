//! Centralized configuration for Spindrift.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::path::PathBuf;
use std::time::Duration;

/// Central configuration for all Spindrift components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct SpindriftConfig {
    pub server: ServerConfig,
    pub fetch: FetchConfig,
}

impl SpindriftConfig {
    /// Builds a configuration with environment overrides applied.
    ///
    /// Currently honors `PORT` for the HTTP listen port, matching the
    /// conventional deployment contract for streaming gateways.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(port) = std::env::var("PORT")
            && let Ok(port) = port.parse::<u16>()
        {
            config.server.port = port;
        }
        config
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind the HTTP listener to
    pub host: String,
    /// TCP port for the HTTP listener
    pub port: u16,
    /// Directory served at the web root for static client assets
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 12345,
            static_dir: PathBuf::from("client/build"),
        }
    }
}

/// Fetch-engine tuning parameters.
///
/// Used by the simulation engine to pace its event stream; a production
/// engine implementation is free to ignore the pacing knobs.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Delay before metadata resolves for a new fetch
    pub metadata_delay: Duration,
    /// Interval between progress updates
    pub progress_interval: Duration,
    /// Number of progress updates emitted before completion
    pub progress_steps: u32,
    /// Reported download rate in bytes per second
    pub simulated_download_bps: u64,
    /// Reported peer count once a fetch is active
    pub simulated_peers: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            metadata_delay: Duration::ZERO,
            progress_interval: Duration::from_millis(10),
            progress_steps: 4,
            simulated_download_bps: 5 * 1024 * 1024, // 5 MiB/s
            simulated_peers: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_server_values() {
        let config = SpindriftConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 12345);
        assert!(config.fetch.progress_steps > 0);
    }
}
