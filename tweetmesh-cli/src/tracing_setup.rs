//! Tracing setup for the tweetmesh CLI
//!
//! Usage:
//!   tweetmesh --debug serve content          # Debug logging to console
//!   RUST_LOG=tweetmesh_server=debug tweetmesh serve social
//!
//! `RUST_LOG` always wins over `--debug` when set.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Tracing configuration options
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Enable debug logging (sets the filter to debug if RUST_LOG is unset)
    pub debug: bool,
}

fn default_directive(config: &TracingConfig) -> &'static str {
    if config.debug {
        "debug"
    } else {
        "info"
    }
}

/// Initialize console tracing
pub fn init_tracing(config: &TracingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.debug) // Show targets in debug mode
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_selects_debug_level() {
        assert_eq!(default_directive(&TracingConfig { debug: true }), "debug");
        assert_eq!(default_directive(&TracingConfig::default()), "info");
    }
}
