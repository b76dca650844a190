//! Token signing settings.
//!
//! - `SALES_AUTH_KEY_ID`: KID the service signs and verifies under
//! - `SALES_AUTH_PRIVATE_KEY_FILE`: RSA private key in PEM form
//! - `SALES_AUTH_PUBLIC_KEY_FILE`: matching public key used for validation
//! - `SALES_AUTH_ALGORITHM`: signature algorithm name (default `RS256`)
//! - `SALES_AUTH_LEEWAY_SECS`: clock skew tolerated on `exp`/`iat` (default 60)

use crate::{env_or, env_parse};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthConfig {
    pub key_id: String,
    pub private_key_file: String,
    pub public_key_file: String,
    pub algorithm: String,
    pub leeway: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            key_id: "32bc1165-24t2-61a7-af3e-9da4agf2h1p1".to_string(),
            private_key_file: "/app/private.pem".to_string(),
            public_key_file: "/app/public.pem".to_string(),
            algorithm: "RS256".to_string(),
            leeway: 60,
        }
    }
}

impl AuthConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            key_id: env_or("SALES_AUTH_KEY_ID", &defaults.key_id),
            private_key_file: env_or("SALES_AUTH_PRIVATE_KEY_FILE", &defaults.private_key_file),
            public_key_file: env_or("SALES_AUTH_PUBLIC_KEY_FILE", &defaults.public_key_file),
            algorithm: env_or("SALES_AUTH_ALGORITHM", &defaults.algorithm),
            leeway: env_parse("SALES_AUTH_LEEWAY_SECS", defaults.leeway),
        }
    }
}
