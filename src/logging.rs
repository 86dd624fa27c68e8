//! Log output for Acme.
//!
//! Logs go to stderr so stdout stays free for the RPC protocol.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::types::settings::LoggingSettings;

/// Installs the global subscriber. `RUST_LOG` overrides the configured level.
///
/// Returns false if a subscriber was already installed.
pub fn init(settings: &LoggingSettings) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if settings.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    result.is_ok()
}
