//! Tracing setup for applications embedding usergate
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! embedding application's call. This is the default one.
//!
//! Environment variables:
//!   RUST_LOG                          # Log filter (default: info)

use tracing_subscriber::EnvFilter;

/// Tracing configuration options
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Enable debug logging (used when RUST_LOG is not set)
    pub debug: bool,
}

/// Filter used when RUST_LOG is unset.
pub fn default_filter(config: &TracingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if config.debug { "debug" } else { "info" }))
}

/// Install a compact console subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init(config: &TracingConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(config.debug)
        .compact();

    tracing_subscriber::registry()
        .with(default_filter(config))
        .with(fmt_layer)
        .try_init()
}
