#![forbid(unsafe_code)]

//! JSON log output for production hosts.
//!
//! Installs a global `tracing` subscriber that writes one JSON object per
//! event. Filtering follows `RUST_LOG`, defaulting to `info` for the engine
//! crates. Tier-change evidence is emitted at `debug`, so
//! `RUST_LOG=lightbox_runtime=debug` captures it.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "lightbox_core=info,lightbox_runtime=info";

/// Install the JSON subscriber. Fails if a global subscriber is already set.
pub fn init_json_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(false)
        .try_init()
}
