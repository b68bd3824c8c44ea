//! Structured logging setup.
//!
//! Every service logs through `tracing`; this module installs the global
//! subscriber once per process. `RUST_LOG` takes precedence over the
//! configured level so operators can raise verbosity without editing the
//! configuration file.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Output encoding of log records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Human,
    /// One JSON object per record.
    Json,
}

impl LogFormat {
    /// Parses a format name as used in configuration and environment
    /// overrides.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "human" | "text" => Some(Self::Human),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Filter directive applied when `RUST_LOG` is unset, e.g. `info` or
    /// `atelier=debug`.
    pub level: String,
    /// Record encoding.
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Human,
        }
    }
}

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured level is not a valid filter directive.
    #[error("invalid log filter '{directive}': {message}")]
    InvalidFilter {
        /// Directive that failed to parse.
        directive: String,
        /// Parser message.
        message: String,
    },

    /// A global subscriber was installed earlier in this process.
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialised,
}

fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|err| TelemetryError::InvalidFilter {
        directive: config.level.clone(),
        message: err.to_string(),
    })
}

/// Installs the global `tracing` subscriber.
///
/// Records are written to standard error.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] when the level does not parse
/// and [`TelemetryError::AlreadyInitialised`] when called twice.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(config)?;
    let output = match config.format {
        LogFormat::Human => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(false)
            .boxed(),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .try_init()
        .map_err(|_| TelemetryError::AlreadyInitialised)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("json", Some(LogFormat::Json))]
    #[case(" JSON ", Some(LogFormat::Json))]
    #[case("human", Some(LogFormat::Human))]
    #[case("text", Some(LogFormat::Human))]
    #[case("yaml", None)]
    fn parses_format_names(#[case] input: &str, #[case] expected: Option<LogFormat>) {
        assert_eq!(LogFormat::parse(input), expected);
    }

    #[test]
    fn deserialises_partial_configuration_with_defaults() {
        let config: TelemetryConfig =
            serde_json::from_str(r#"{"format": "json"}"#).expect("valid telemetry config");

        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Json);
    }
}
