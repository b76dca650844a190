//! Claims carried inside a signed token.
//!
//! [`Claims`] holds the registered JWT claims the service relies on (`iss`,
//! `sub`, `aud`, `exp`, `iat`) plus the service-specific `roles` list used for
//! authorization. Once a token is signed the roles are trusted as-is.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Full administrative access.
pub const ROLE_ADMIN: &str = "ADMIN";
/// Master role, reserved for account owners.
pub const ROLE_MASTER: &str = "MASTER";
/// Day-to-day operator access.
pub const ROLE_OPERATOR: &str = "OPERATOR";

/// Authorization claims transmitted via a token.
///
/// Timestamps are Unix seconds. Sub-second precision is dropped at issuance,
/// so a validated token yields exactly the claims that were signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer
    pub iss: String,
    /// Principal the token identifies
    pub sub: String,
    /// Intended audiences
    pub aud: Vec<String>,
    /// Expiration timestamp (Unix seconds)
    pub exp: u64,
    /// Issued-at timestamp (Unix seconds)
    pub iat: u64,
    /// Role names granted to the principal
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Claims {
    /// Builds claims issued now and expiring after `ttl`.
    pub fn new(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        audience: Vec<String>,
        ttl: Duration,
        roles: Vec<String>,
    ) -> Self {
        let now = now_unix();
        Self {
            iss: issuer.into(),
            sub: subject.into(),
            aud: audience,
            exp: now.saturating_add(ttl.as_secs()),
            iat: now,
            roles,
        }
    }

    /// Returns true if the claims hold at least one of the provided roles.
    pub fn has_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        self.roles
            .iter()
            .any(|has| roles.iter().any(|want| has == want.as_ref()))
    }
}

pub(crate) fn now_unix() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}
