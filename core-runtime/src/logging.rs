//! # Logging & Tracing Infrastructure
//!
//! Configures the `tracing-subscriber` stack for the pipeline:
//! - Pretty, JSON, and compact output formats
//! - Module-level filtering via `EnvFilter` directives
//! - `RUST_LOG` override support
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LoggingConfig, LogFormat};
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Pretty)
//!     .with_directive("core_sync=debug");
//!
//! init_logging(config).expect("Failed to initialize logging");
//!
//! tracing::info!("Pipeline starting");
//! ```

use crate::error::{Error, Result};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format with colors
    Pretty,
    /// Structured JSON format for machine parsing
    Json,
    /// Compact format for production
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Default level directive when `RUST_LOG` is not set
    pub default_level: String,
    /// Additional per-module filter directives, e.g. `core_sync=debug`
    pub directives: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            default_level: "info".to_string(),
            directives: Vec::new(),
        }
    }
}

impl LoggingConfig {
    /// Set the output format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the default level directive (`trace`..`error`)
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into();
        self
    }

    /// Add a per-module filter directive
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    fn build_filter(&self) -> Result<EnvFilter> {
        let mut filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&self.default_level)
                .map_err(|e| Error::Config(format!("Invalid log level directive: {}", e)))?,
        };

        for directive in &self.directives {
            filter = filter.add_directive(directive.parse().map_err(|e| {
                Error::Config(format!("Invalid filter directive '{}': {}", directive, e))
            })?);
        }

        Ok(filter)
    }
}

/// Initialize the global tracing subscriber.
///
/// Must be called at most once per process; a second call fails with a
/// `Logging` error rather than panicking so test harnesses can race freely.
///
/// # Errors
///
/// Returns an error if a filter directive is malformed or a subscriber is
/// already installed.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = config.build_filter()?;

    let fmt_layer = match config.format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer().pretty().boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Logging(format!("Failed to install subscriber: {}", e)))?;

    tracing::debug!(format = ?config.format, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.default_level, "info");
        assert!(config.directives.is_empty());
    }

    #[test]
    fn test_builder_chain() {
        let config = LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level("debug")
            .with_directive("core_sync=trace");

        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.default_level, "debug");
        assert_eq!(config.directives, vec!["core_sync=trace".to_string()]);
    }

    #[test]
    fn test_build_filter_valid_directives() {
        let config = LoggingConfig::default()
            .with_level("warn")
            .with_directive("core_presentation=debug");
        assert!(config.build_filter().is_ok());
    }

    #[test]
    fn test_build_filter_invalid_directive() {
        let config = LoggingConfig::default().with_directive("not a directive ===");
        assert!(config.build_filter().is_err());
    }
}
