//! # Sales Auth
//!
//! Authentication and authorization support for the sales API.
//!
//! - [`claims`]: the [`Claims`] payload and the recognized role names
//! - [`keys`]: the concurrency-safe [`KeyStore`] of private signing keys
//! - [`jwt`]: the [`Auth`] token service (issue, validate, rotate keys)
//!
//! Signing and verification are delegated to `jsonwebtoken`; this crate only
//! decides which key and which algorithm are acceptable.

pub mod claims;
pub mod error;
pub mod jwt;
pub mod keys;

pub use claims::{Claims, ROLE_ADMIN, ROLE_MASTER, ROLE_OPERATOR};
pub use error::AuthError;
pub use jwt::{Auth, DEFAULT_LEEWAY, PublicKeyLookup, single_key_lookup};
pub use keys::{KeyStore, private_key_from_pem, public_key_from_pem};

// Callers need these to build keys and pick the algorithm.
pub use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
