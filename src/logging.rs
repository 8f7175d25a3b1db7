//! Log subscriber setup
//!
//! Builds a `tracing_subscriber` registry from [`LoggingConfig`]:
//!
//! ```text
//! Registry
//!   ├── EnvFilter (RUST_LOG, falling back to the configured level)
//!   └── Fmt Layer (json or pretty, written to stderr)
//! ```
//!
//! Output goes to stderr so stdout stays free for command results.

use crate::config::LoggingConfig;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

/// Logging setup errors
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter '{0}'")]
    InvalidFilter(String),

    #[error("Failed to set global subscriber (may already be initialized): {0}")]
    AlreadyInitialized(String),
}

/// Build the env filter: `RUST_LOG` wins, then `level_override`, then the config
pub fn build_filter(
    config: &LoggingConfig,
    level_override: Option<&str>,
) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let level = level_override.unwrap_or(config.level.as_str()).to_lowercase();
    EnvFilter::try_new(&level).map_err(|_| LoggingError::InvalidFilter(level))
}

/// Install the global subscriber
pub fn init_logging(
    config: &LoggingConfig,
    level_override: Option<&str>,
) -> Result<(), LoggingError> {
    let env_filter = build_filter(config, level_override)?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true);

    let result = if config.format == "pretty" {
        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.pretty());
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json());
        tracing::subscriber::set_global_default(subscriber)
    };

    result.map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}
