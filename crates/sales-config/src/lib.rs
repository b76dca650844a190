//! # Sales Config
//!
//! Configuration for the sales API, loaded from environment variables.
//!
//! - [`web`]: listener addresses and the shutdown drain window
//! - [`auth`]: signing key, algorithm and clock leeway
//! - [`database`]: PostgreSQL connection settings
//! - [`observability`]: OpenTelemetry export and log format
//!
//! Every value has a development default, and values that fail to parse
//! fall back to that default. Call `dotenvy::dotenv()` first if a `.env`
//! file should be honored.
//!
//! # Example
//!
//! ```ignore
//! use sales_config::Config;
//!
//! let config = Config::from_env();
//! tracing::info!("startup config:\n{}", config);
//! ```

use std::fmt;
use std::str::FromStr;

pub mod auth;
pub mod database;
pub mod observability;
pub mod web;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use observability::{LogFormat, ObservabilityConfig};
pub use web::WebConfig;

/// Build string reported by the healthcheck and debug endpoints.
pub const BUILD: &str = env!("CARGO_PKG_VERSION");

/// Complete service configuration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    pub web: WebConfig,
    pub auth: AuthConfig,
    pub db: DatabaseConfig,
    pub observability: ObservabilityConfig,
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            web: WebConfig::from_env(),
            auth: AuthConfig::from_env(),
            db: DatabaseConfig::from_env(),
            observability: ObservabilityConfig::from_env(),
        }
    }
}

/// Renders the effective configuration with secrets masked.
impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--web-api-host={}", self.web.api_host)?;
        writeln!(f, "--web-debug-host={}", self.web.debug_host)?;
        writeln!(f, "--web-shutdown-timeout={}s", self.web.shutdown_timeout.as_secs())?;
        writeln!(f, "--auth-key-id={}", self.auth.key_id)?;
        writeln!(f, "--auth-private-key-file={}", self.auth.private_key_file)?;
        writeln!(f, "--auth-public-key-file={}", self.auth.public_key_file)?;
        writeln!(f, "--auth-algorithm={}", self.auth.algorithm)?;
        writeln!(f, "--auth-leeway={}s", self.auth.leeway)?;
        writeln!(f, "--db-user={}", self.db.user)?;
        writeln!(f, "--db-password=xxxxxx")?;
        writeln!(f, "--db-host={}", self.db.host)?;
        writeln!(f, "--db-name={}", self.db.name)?;
        writeln!(f, "--db-disable-tls={}", self.db.disable_tls)?;
        writeln!(f, "--db-max-connections={}", self.db.max_connections)?;
        writeln!(f, "--observability-enabled={}", self.observability.enabled)?;
        writeln!(f, "--otlp-endpoint={}", self.observability.otlp_endpoint)?;
        writeln!(f, "--trace-probability={}", self.observability.trace_probability)?;
        write!(f, "--log-format={}", self.observability.log_format)
    }
}

pub(crate) fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

pub(crate) fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_masks_password() {
        let config = Config::default();
        let rendered = config.to_string();

        assert!(rendered.contains("--db-user=testuser"));
        assert!(rendered.contains("--db-password=xxxxxx"));
        assert!(!rendered.contains(&config.db.password));
    }

    #[test]
    fn test_env_parse_falls_back_on_garbage() {
        // SAFETY: the variable is unique to this test.
        unsafe { std::env::set_var("SALES_CONFIG_TEST_GARBAGE", "not-a-number") };
        assert_eq!(env_parse("SALES_CONFIG_TEST_GARBAGE", 42u64), 42);
        unsafe { std::env::remove_var("SALES_CONFIG_TEST_GARBAGE") };
    }

    #[test]
    fn test_env_parse_reads_value() {
        // SAFETY: the variable is unique to this test.
        unsafe { std::env::set_var("SALES_CONFIG_TEST_NUMBER", " 17 ") };
        assert_eq!(env_parse("SALES_CONFIG_TEST_NUMBER", 0u32), 17);
        unsafe { std::env::remove_var("SALES_CONFIG_TEST_NUMBER") };
    }
}
