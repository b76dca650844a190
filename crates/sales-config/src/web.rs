//! Listener and lifecycle settings.
//!
//! - `SALES_WEB_API_HOST`: API listener (default `0.0.0.0:3000`)
//! - `SALES_WEB_DEBUG_HOST`: debug/metrics listener (default `0.0.0.0:4000`)
//! - `SALES_WEB_SHUTDOWN_TIMEOUT_SECS`: drain window on shutdown (default 5)

use std::time::Duration;

use crate::{env_or, env_parse};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebConfig {
    pub api_host: String,
    pub debug_host: String,
    /// How long in-flight requests may take to finish once shutdown starts.
    pub shutdown_timeout: Duration,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0:3000".to_string(),
            debug_host: "0.0.0.0:4000".to_string(),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl WebConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_host: env_or("SALES_WEB_API_HOST", &defaults.api_host),
            debug_host: env_or("SALES_WEB_DEBUG_HOST", &defaults.debug_host),
            shutdown_timeout: Duration::from_secs(env_parse(
                "SALES_WEB_SHUTDOWN_TIMEOUT_SECS",
                defaults.shutdown_timeout.as_secs(),
            )),
        }
    }
}
