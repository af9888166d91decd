//! Tracing setup for the student-db CLI
//!
//! Usage:
//!   student-db --debug ...              # Debug logging to console
//!   RUST_LOG=studentdb_server=debug ... # Fine-grained log control
//!
//! Environment variables:
//!   RUST_LOG                            # Log filter (default: info)

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Tracing configuration options
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Enable debug logging (used unless RUST_LOG is explicitly set)
    pub debug: bool,
}

impl TracingConfig {
    fn default_directive(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}

/// Initialize console tracing. Logs go to stderr so command output stays
/// clean on stdout.
pub fn init(config: &TracingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.debug) // Show targets in debug mode
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}
