//! Logging configuration.
//!
//! The engine logs through the `log` facade; those records reach the
//! subscriber through its `tracing-log` bridge.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging to stderr, keeping stdout for the game.
///
/// Levels are configurable via the `RUST_LOG` env var and default to `info`.
///
/// # Example
///
/// ```no_run
/// use dt_client::logging;
///
/// logging::init();
/// tracing::info!("client starting");
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::debug!("logging initialized");
}
