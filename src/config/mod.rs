//! Configuration module for HTTP Uploadr
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and validation. Every section is optional.
//!
//! # Example
//!
//! ```yaml
//! client:
//!   timeout_secs: 300
//!   connect_timeout_secs: 10
//! accessors:
//!   default: file
//!   file:
//!     root: "${UPLOAD_ROOT:-/var/lib/uploads}"
//! logging:
//!   level: info
//!   format: json
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// Variable names must start with a letter or underscore and contain only
/// uppercase letters, digits, and underscores.
pub(crate) fn expand_env_vars(s: &str) -> String {
    let re = match regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]+))?\}") {
        Ok(re) => re,
        Err(_) => return s.to_string(),
    };
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in re.captures_iter(s) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name.as_str()) {
            Ok(val) => val,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                // No env var and no default. Keep the original placeholder.
                None => full_match.as_str().to_string(),
            },
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);

    result
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub accessors: AccessorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client.user_agent.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "client.user_agent cannot be empty".into(),
            ));
        }

        match self.accessors.default.as_str() {
            crate::accessor::FILE_ACCESSOR | crate::accessor::DATA_ACCESSOR => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Unknown default accessor '{}': must be 'file' or 'data'",
                    other
                )))
            }
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level '{}': must be 'trace', 'debug', 'info', 'warn' or 'error'",
                    self.logging.level
                )))
            }
        }

        match self.logging.format.as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format '{}': must be 'json' or 'pretty'",
                    self.logging.format
                )))
            }
        }

        Ok(())
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Whole-request timeout in seconds, 0 disables it
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Connect timeout in seconds, 0 disables it
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("http-uploadr/{}", crate::VERSION)
}

/// Accessor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessorsConfig {
    /// Accessor used when a call names none
    #[serde(default = "default_accessor")]
    pub default: String,
    #[serde(default)]
    pub file: FileAccessorConfig,
}

impl Default for AccessorsConfig {
    fn default() -> Self {
        Self {
            default: default_accessor(),
            file: FileAccessorConfig::default(),
        }
    }
}

fn default_accessor() -> String {
    crate::accessor::FILE_ACCESSOR.to_string()
}

/// Local filesystem accessor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileAccessorConfig {
    /// Directory relative identifiers are resolved against
    #[serde(default)]
    pub root: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "json" or "pretty"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

fn default_metrics_enabled() -> bool {
    true
}
