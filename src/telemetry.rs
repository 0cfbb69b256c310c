//! Tracing and logging setup
//!
//! Configures the `tracing` subscriber with environment-based filtering.
//! `CHRONICLE_LOG` takes precedence over the configured level.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::settings::LogSettings;

/// Environment variable consulted before the configured level
pub const LOG_ENV_VAR: &str = "CHRONICLE_LOG";

/// Error returned when a global subscriber is already installed
#[derive(Debug, thiserror::Error)]
#[error("Failed to initialize tracing: {0}")]
pub struct TracingError(String);

fn build_filter(settings: &LogSettings) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(&settings.level))
}

/// Initialize the tracing subscriber, returning an error if one is already set
pub fn try_init_tracing(settings: &LogSettings) -> Result<(), TracingError> {
    let filter = build_filter(settings);
    let registry = tracing_subscriber::registry().with(filter);

    if settings.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| TracingError(e.to_string()))
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| TracingError(e.to_string()))
    }
}

/// Initialize the tracing subscriber
///
/// Repeated calls are ignored so tests and embedding applications can call
/// this freely.
pub fn init_tracing(settings: &LogSettings) {
    let _ = try_init_tracing(settings);
}
