//! Structured logging initialisation via `tracing`.
//!
//! Two output formats are supported:
//! - [`LogFormat::Human`]: coloured, human-readable lines (development).
//! - [`LogFormat::Json`]: newline-delimited JSON (production / log aggregation).
//!
//! The filter level can be overridden at runtime via the `RUST_LOG`
//! environment variable. When `RUST_LOG` is not set, the caller-supplied
//! `level` string is used (e.g. `"info"`, `"debug,idproof_proofing=trace"`).
//!
//! Applicant data never reaches a subscriber: identity and secret types
//! print as `[REDACTED]`, and call sites log handles, trace ids and vendor
//! statuses only.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Selects the output format for structured logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Pretty-printed, coloured output for local development.
    #[default]
    Human,
    /// Newline-delimited JSON for production and log aggregation pipelines.
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => Err(LoggingError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("unknown log format {0:?} (expected \"human\" or \"json\")")]
    UnknownFormat(String),

    #[error("invalid log filter: {0}")]
    Filter(String),

    #[error("a global subscriber is already installed")]
    AlreadyInitialised,
}

/// Initialise the global tracing subscriber.
pub fn init_logging(format: LogFormat, level: &str) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|e| LoggingError::Filter(e.to_string()))?,
    };

    let result = match format {
        LogFormat::Human => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init(),
    };
    result.map_err(|_| LoggingError::AlreadyInitialised)
}
