//! Structured logging

use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Install a JSON `tracing` subscriber filtered by `service.log_level`.
///
/// An unparsable filter falls back to `info`. Returns `false` when a global
/// subscriber was already installed, which leaves that subscriber in place.
pub fn init_tracing(config: &Config) -> bool {
    let filter = EnvFilter::try_new(&config.service.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Tracing initialized for service: {}", config.service.name);
    }
    installed
}
