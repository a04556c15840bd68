//! Tracing/logging initialization.
//!
//! Filter and output format come from the environment:
//! `STOREFRONT_LOG` (falling back to `RUST_LOG`, then `info`) and
//! `STOREFRONT_LOG_FORMAT` (`json`, `pretty` or `compact`).

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const LOG_FILTER_VAR: &str = "STOREFRONT_LOG";
pub const FALLBACK_FILTER_VAR: &str = "RUST_LOG";
pub const LOG_FORMAT_VAR: &str = "STOREFRONT_LOG_FORMAT";

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ObservabilityError {
    #[error("unknown log format: {0}")]
    InvalidFormat(String),

    #[error("invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("failed to install subscriber: {0}")]
    Install(String),
}

/// Log line layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
    Compact,
}

impl FromStr for LogFormat {
    type Err = ObservabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(ObservabilityError::InvalidFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directives, e.g. `info,storefront_infra=debug`.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::default(),
        }
    }
}

impl ObservabilityConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Blank values count as unset. An unknown format falls back to JSON.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let filter = non_blank(LOG_FILTER_VAR)
            .or_else(|| non_blank(FALLBACK_FILTER_VAR))
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        let format = non_blank(LOG_FORMAT_VAR)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();

        Self { filter, format }
    }

    fn env_filter(&self) -> Result<EnvFilter, ObservabilityError> {
        EnvFilter::try_new(&self.filter).map_err(|e| ObservabilityError::InvalidFilter {
            filter: self.filter.clone(),
            reason: e.to_string(),
        })
    }
}

/// Initialize tracing/logging for the process from the environment.
///
/// Safe to call multiple times (subsequent calls are no-ops). An unparsable
/// filter falls back to `info`.
pub fn init() {
    let config = ObservabilityConfig::from_env();
    let config = match config.env_filter() {
        Ok(_) => config,
        Err(_) => ObservabilityConfig {
            filter: DEFAULT_FILTER.to_string(),
            ..config
        },
    };
    let _ = init_with(&config);
}

/// Install a global subscriber for `config`.
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn init_with(config: &ObservabilityConfig) -> Result<(), ObservabilityError> {
    let filter = config.env_filter()?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };

    installed.map_err(|e| ObservabilityError::Install(e.to_string()))?;
    ::tracing::debug!(format = ?config.format, filter = %config.filter, "tracing subscriber installed");
    Ok(())
}
