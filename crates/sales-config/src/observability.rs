//! Tracing export and console log settings.
//!
//! - `OBSERVABILITY_ENABLED`: export spans over OTLP and install the
//!   Prometheus recorder (default `true`)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: collector address (default `http://localhost:4317`)
//! - `SALES_TRACE_PROBABILITY`: share of traces sampled (default 0.05)
//! - `LOG_FORMAT`: `compact` or `json` (default `compact`)

use std::fmt;
use std::str::FromStr;

use crate::{env_or, env_parse};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compact => f.write_str("compact"),
            Self::Json => f.write_str("json"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObservabilityConfig {
    pub enabled: bool,
    pub otlp_endpoint: String,
    pub trace_probability: f64,
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            otlp_endpoint: "http://localhost:4317".to_string(),
            trace_probability: 0.05,
            log_format: LogFormat::Compact,
        }
    }
}

impl ObservabilityConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_parse("OBSERVABILITY_ENABLED", defaults.enabled),
            otlp_endpoint: env_or("OTEL_EXPORTER_OTLP_ENDPOINT", &defaults.otlp_endpoint),
            trace_probability: env_parse("SALES_TRACE_PROBABILITY", defaults.trace_probability)
                .clamp(0.0, 1.0),
            log_format: env_parse("LOG_FORMAT", defaults.log_format),
        }
    }
}
