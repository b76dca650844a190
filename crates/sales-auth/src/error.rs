use jsonwebtoken::Algorithm;
use thiserror::Error;

/// Failures raised while issuing or validating tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No private key is registered under the requested KID.
    #[error("kid lookup failed: no private key for kid {0:?}")]
    KeyNotFound(String),

    #[error("signing token")]
    SigningFailure(#[source] jsonwebtoken::errors::Error),

    /// The token or its header cannot be parsed, or the header has no usable KID.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("looking up public key for kid {kid:?}")]
    KeyLookupFailure {
        kid: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("token algorithm {found:?} does not match expected {expected:?}")]
    AlgorithmMismatch {
        expected: Algorithm,
        found: Algorithm,
    },

    #[error("invalid token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    #[error("token issued in the future")]
    IssuedInFuture,
}

impl AuthError {
    /// True for failures caused by the presented token rather than by issuance.
    pub fn is_validation_failure(&self) -> bool {
        !matches!(
            self,
            AuthError::KeyNotFound(_) | AuthError::SigningFailure(_)
        )
    }
}
