//! Token issuance and validation.
//!
//! [`Auth`] signs [`Claims`] with a private key picked from its [`KeyStore`]
//! by KID, and validates incoming tokens by resolving the KID in the token
//! header to a public key through a caller-supplied [`PublicKeyLookup`].
//!
//! The signing algorithm is fixed when the service is built. A token whose
//! header names any other algorithm is rejected before a key is even looked
//! up, which closes the algorithm-confusion class of attacks (for example an
//! HS256 token "signed" with the RSA public key).
//!
//! # Key rotation
//!
//! Add the new key under a new KID, start issuing with it, and keep the old
//! KID resolvable until every token it signed has expired. Validation always
//! follows the KID embedded in the presented token.
//!
//! [`Auth::remove_key`] retires a KID: its private key is dropped and tokens
//! carrying it are rejected from then on, whatever the public key lookup
//! still returns for it. Adding a key under the same KID again reinstates it.
//!
//! # Example
//!
//! ```ignore
//! use jsonwebtoken::Algorithm;
//! use sales_auth::{Auth, Claims, KeyStore, single_key_lookup};
//!
//! let keys: KeyStore = [(kid.clone(), private_key)].into_iter().collect();
//! let auth = Auth::new(Algorithm::RS256, single_key_lookup(kid.clone(), public_key), keys);
//!
//! let token = auth.generate_token(&kid, &claims)?;
//! let claims = auth.validate_token(&token)?;
//! ```

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::anyhow;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
};

use crate::claims::{Claims, now_unix};
use crate::error::AuthError;
use crate::keys::KeyStore;

/// Clock skew tolerated on `exp` and `iat`, in seconds.
pub const DEFAULT_LEEWAY: u64 = 60;

/// Resolves a KID to the public key that verifies tokens signed under it.
///
/// In production this is usually backed by a JWKS endpoint; any
/// `Fn(&str) -> anyhow::Result<DecodingKey>` closure qualifies.
pub trait PublicKeyLookup: Send + Sync {
    fn lookup(&self, kid: &str) -> anyhow::Result<DecodingKey>;
}

impl<F> PublicKeyLookup for F
where
    F: Fn(&str) -> anyhow::Result<DecodingKey> + Send + Sync,
{
    fn lookup(&self, kid: &str) -> anyhow::Result<DecodingKey> {
        self(kid)
    }
}

/// Lookup that knows exactly one KID.
pub fn single_key_lookup(kid: impl Into<String>, key: DecodingKey) -> impl PublicKeyLookup {
    let known = kid.into();
    move |kid: &str| -> anyhow::Result<DecodingKey> {
        if kid == known {
            Ok(key.clone())
        } else {
            Err(anyhow!("no public key found for the specified kid: {kid}"))
        }
    }
}

/// Authenticates clients: issues tokens for claims and recreates the claims
/// from a presented token.
pub struct Auth {
    algorithm: Algorithm,
    lookup: Arc<dyn PublicKeyLookup>,
    keys: KeyStore,
    retired: RwLock<HashSet<String>>,
    validation: Validation,
}

impl Auth {
    /// Builds the service. Key lookup happens per validation call, so
    /// construction cannot fail.
    pub fn new(
        algorithm: Algorithm,
        lookup: impl PublicKeyLookup + 'static,
        keys: KeyStore,
    ) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.leeway = DEFAULT_LEEWAY;
        validation.validate_aud = false;

        Self {
            algorithm,
            lookup: Arc::new(lookup),
            keys,
            retired: RwLock::default(),
            validation,
        }
    }

    /// Sets the clock skew tolerated on temporal claims.
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.validation.leeway = seconds;
        self
    }

    /// Only accept tokens whose `iss` is one of `issuers`.
    pub fn with_issuer<T: ToString>(mut self, issuers: &[T]) -> Self {
        self.validation.set_issuer(issuers);
        self
    }

    /// Only accept tokens whose `aud` intersects `audience`.
    pub fn with_audience<T: ToString>(mut self, audience: &[T]) -> Self {
        self.validation.set_audience(audience);
        self.validation.validate_aud = true;
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Private signing keys, for rotation and introspection.
    pub fn keys(&self) -> &KeyStore {
        &self.keys
    }

    /// Registers a private key under `kid`, replacing any previous one.
    pub fn add_key(&self, kid: impl Into<String>, key: EncodingKey) {
        let kid = kid.into();
        let mut retired = self.retired.write().unwrap_or_else(PoisonError::into_inner);
        retired.remove(&kid);
        self.keys.add(kid, key);
    }

    /// Drops the private key for `kid` and stops accepting tokens signed
    /// under it. Absent KIDs are ignored.
    pub fn remove_key(&self, kid: &str) {
        let mut retired = self.retired.write().unwrap_or_else(PoisonError::into_inner);
        retired.insert(kid.to_string());
        self.keys.remove(kid);
    }

    fn is_retired(&self, kid: &str) -> bool {
        self.retired
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(kid)
    }

    /// Signs `claims` with the private key registered under `kid`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::KeyNotFound`] if no key is registered for `kid`
    /// - [`AuthError::SigningFailure`] if the key cannot sign with the
    ///   configured algorithm
    pub fn generate_token(&self, kid: &str, claims: &Claims) -> Result<String, AuthError> {
        let key = self
            .keys
            .get(kid)
            .ok_or_else(|| AuthError::KeyNotFound(kid.to_string()))?;

        let mut header = Header::new(self.algorithm);
        header.kid = Some(kid.to_string());

        encode(&header, claims, &key).map_err(AuthError::SigningFailure)
    }

    /// Verifies `token` and returns the claims it carries.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MalformedToken`] if the header cannot be parsed or
    ///   carries no string `kid`
    /// - [`AuthError::AlgorithmMismatch`] if the header names an algorithm
    ///   other than the configured one
    /// - [`AuthError::KeyLookupFailure`] if the KID does not resolve or was
    ///   removed with [`Auth::remove_key`]
    /// - [`AuthError::InvalidToken`] on a bad signature, expired token or
    ///   rejected issuer/audience
    /// - [`AuthError::IssuedInFuture`] if `iat` lies beyond the leeway
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let header =
            decode_header(token).map_err(|e| AuthError::MalformedToken(e.to_string()))?;

        let alg = header.alg;
        if alg != self.algorithm {
            return Err(AuthError::AlgorithmMismatch {
                expected: self.algorithm,
                found: alg,
            });
        }

        let kid = header.kid.ok_or_else(|| {
            AuthError::MalformedToken("token header is missing key id (kid)".to_string())
        })?;

        if self.is_retired(&kid) {
            return Err(AuthError::KeyLookupFailure {
                source: anyhow!("key {kid} has been removed"),
                kid,
            });
        }

        let key = self
            .lookup
            .lookup(&kid)
            .map_err(|source| AuthError::KeyLookupFailure { kid, source })?;

        let data = decode::<Claims>(token, &key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidAlgorithm => AuthError::AlgorithmMismatch {
                    expected: self.algorithm,
                    found: alg,
                },
                _ => AuthError::InvalidToken(e),
            }
        })?;

        if data.claims.iat > now_unix().saturating_add(self.validation.leeway) {
            return Err(AuthError::IssuedInFuture);
        }

        Ok(data.claims)
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("algorithm", &self.algorithm)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::claims::ROLE_ADMIN;
    use crate::keys::{private_key_from_pem, public_key_from_pem};

    const PRIVATE_1: &str = include_str!("../testdata/private_1.pem");
    const PUBLIC_1: &str = include_str!("../testdata/public_1.pem");
    const PRIVATE_2: &str = include_str!("../testdata/private_2.pem");
    const PUBLIC_2: &str = include_str!("../testdata/public_2.pem");

    const KID_1: &str = "54bb2165-71e1-41a6-af3e-7da4a0e1e2c1";
    const KID_2: &str = "7f0c1a9e-2b4d-4c3e-9a51-0d6e8f7b3c22";

    fn private(pem: &str) -> EncodingKey {
        private_key_from_pem(pem.as_bytes()).unwrap()
    }

    fn public(pem: &str) -> DecodingKey {
        public_key_from_pem(pem.as_bytes()).unwrap()
    }

    fn two_key_lookup(kid: &str) -> anyhow::Result<DecodingKey> {
        match kid {
            KID_1 => Ok(public(PUBLIC_1)),
            KID_2 => Ok(public(PUBLIC_2)),
            _ => Err(anyhow!("no public key found")),
        }
    }

    fn test_auth() -> Auth {
        let keys: KeyStore = [(KID_1, private(PRIVATE_1))].into_iter().collect();
        Auth::new(Algorithm::RS256, two_key_lookup, keys)
    }

    fn test_claims() -> Claims {
        Claims::new(
            "test issuer",
            "0x01",
            vec!["some_audience".to_string()],
            Duration::from_secs(8760 * 3600),
            vec![ROLE_ADMIN.to_string()],
        )
    }

    #[test]
    fn test_generate_and_validate_round_trip() {
        let auth = test_auth();
        let claims = test_claims();

        let token = auth.generate_token(KID_1, &claims).unwrap();
        let parsed = auth.validate_token(&token).unwrap();

        assert_eq!(parsed, claims);
    }

    #[test]
    fn test_generated_header_carries_kid_and_algorithm() {
        let auth = test_auth();
        let token = auth.generate_token(KID_1, &test_claims()).unwrap();

        let header = decode_header(&token).unwrap();
        assert_eq!(header.kid.as_deref(), Some(KID_1));
        assert_eq!(header.alg, Algorithm::RS256);
    }

    #[test]
    fn test_generate_unknown_kid() {
        let auth = test_auth();
        let err = auth.generate_token("missing", &test_claims()).unwrap_err();
        assert!(matches!(err, AuthError::KeyNotFound(kid) if kid == "missing"));
    }

    #[test]
    fn test_generate_with_key_of_wrong_family() {
        let keys: KeyStore = [(KID_1, EncodingKey::from_secret(b"secret"))]
            .into_iter()
            .collect();
        let auth = Auth::new(Algorithm::RS256, two_key_lookup, keys);

        let err = auth.generate_token(KID_1, &test_claims()).unwrap_err();
        assert!(matches!(err, AuthError::SigningFailure(_)));
    }

    #[test]
    fn test_validate_rejects_other_algorithm_same_key() {
        let keys: KeyStore = [(KID_1, private(PRIVATE_1))].into_iter().collect();
        let rs512 = Auth::new(Algorithm::RS512, two_key_lookup, keys);
        let token = rs512.generate_token(KID_1, &test_claims()).unwrap();

        let err = test_auth().validate_token(&token).unwrap_err();
        assert!(matches!(
            err,
            AuthError::AlgorithmMismatch {
                expected: Algorithm::RS256,
                found: Algorithm::RS512
            }
        ));
    }

    #[test]
    fn test_validate_rejects_hmac_signed_with_public_key() {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(KID_1.to_string());
        let forged = encode(
            &header,
            &test_claims(),
            &EncodingKey::from_secret(PUBLIC_1.as_bytes()),
        )
        .unwrap();

        let err = test_auth().validate_token(&forged).unwrap_err();
        assert!(matches!(err, AuthError::AlgorithmMismatch { .. }));
    }

    #[test]
    fn test_validate_unknown_kid() {
        let keys: KeyStore = [("unknown-kid", private(PRIVATE_1))].into_iter().collect();
        let issuer = Auth::new(Algorithm::RS256, two_key_lookup, keys);
        let token = issuer.generate_token("unknown-kid", &test_claims()).unwrap();

        let err = test_auth().validate_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::KeyLookupFailure { kid, .. } if kid == "unknown-kid"));
    }

    #[test]
    fn test_validate_missing_kid() {
        let token = encode(
            &Header::new(Algorithm::RS256),
            &test_claims(),
            &private(PRIVATE_1),
        )
        .unwrap();

        let err = test_auth().validate_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::MalformedToken(_)));
    }

    #[test]
    fn test_validate_garbage() {
        let err = test_auth().validate_token("invalid.token.here").unwrap_err();
        assert!(matches!(err, AuthError::MalformedToken(_)));

        let err = test_auth().validate_token("").unwrap_err();
        assert!(matches!(err, AuthError::MalformedToken(_)));
    }

    #[test]
    fn test_validate_wrong_signing_key() {
        // Signed with key 2 but claims to be KID 1.
        let keys: KeyStore = [(KID_1, private(PRIVATE_2))].into_iter().collect();
        let impostor = Auth::new(Algorithm::RS256, two_key_lookup, keys);
        let token = impostor.generate_token(KID_1, &test_claims()).unwrap();

        let err = test_auth().validate_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn test_validate_expired() {
        let auth = test_auth();
        let mut claims = test_claims();
        claims.iat = now_unix() - 7200;
        claims.exp = now_unix() - 3600;

        let token = auth.generate_token(KID_1, &claims).unwrap();
        let err = auth.validate_token(&token).unwrap_err();
        match err {
            AuthError::InvalidToken(e) => {
                assert!(matches!(e.kind(), ErrorKind::ExpiredSignature))
            }
            other => panic!("expected expired token, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_issued_in_future() {
        let auth = test_auth();
        let mut claims = test_claims();
        claims.iat = now_unix() + 3600;

        let token = auth.generate_token(KID_1, &claims).unwrap();
        let err = auth.validate_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::IssuedInFuture));
    }

    #[test]
    fn test_validate_issuer_pinning() {
        let auth = test_auth().with_issuer(&["someone else"]);
        let token = auth.generate_token(KID_1, &test_claims()).unwrap();
        assert!(matches!(
            auth.validate_token(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_validate_audience_pinning() {
        let auth = test_auth().with_audience(&["some_audience"]);
        let token = auth.generate_token(KID_1, &test_claims()).unwrap();
        assert!(auth.validate_token(&token).is_ok());

        let auth = test_auth().with_audience(&["other_audience"]);
        assert!(matches!(
            auth.validate_token(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_key_rotation() {
        let auth = test_auth();
        let claims = test_claims();

        auth.add_key(KID_2, private(PRIVATE_2));
        let old = auth.generate_token(KID_1, &claims).unwrap();
        let new = auth.generate_token(KID_2, &claims).unwrap();
        assert!(auth.validate_token(&old).is_ok());
        assert!(auth.validate_token(&new).is_ok());

        auth.remove_key(KID_1);
        assert!(matches!(
            auth.generate_token(KID_1, &claims),
            Err(AuthError::KeyNotFound(_))
        ));
        assert!(matches!(
            auth.validate_token(&old),
            Err(AuthError::KeyLookupFailure { kid, .. }) if kid == KID_1
        ));
        assert!(auth.validate_token(&new).is_ok());
        assert!(auth.generate_token(KID_2, &claims).is_ok());
        assert_eq!(auth.keys().kids(), vec![KID_2.to_string()]);
    }

    #[test]
    fn test_readding_removed_key_reinstates_it() {
        let auth = test_auth();
        let token = auth.generate_token(KID_1, &test_claims()).unwrap();

        auth.remove_key(KID_1);
        assert!(auth.validate_token(&token).is_err());

        auth.add_key(KID_1, private(PRIVATE_1));
        assert!(auth.validate_token(&token).is_ok());
    }

    #[test]
    fn test_remove_unknown_key_leaves_others_valid() {
        let auth = test_auth();
        let token = auth.generate_token(KID_1, &test_claims()).unwrap();

        auth.remove_key("missing");

        assert!(auth.validate_token(&token).is_ok());
        assert_eq!(auth.keys().kids(), vec![KID_1.to_string()]);
    }

    #[test]
    fn test_single_key_lookup() {
        let lookup = single_key_lookup(KID_1, public(PUBLIC_1));
        assert!(lookup.lookup(KID_1).is_ok());
        assert!(lookup.lookup(KID_2).is_err());
    }

    #[test]
    fn test_concurrent_generate_during_rotation() {
        let auth = test_auth();
        let claims = test_claims();
        let rotating = private(PRIVATE_2);

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..25 {
                        let token = auth.generate_token(KID_1, &claims).unwrap();
                        assert!(auth.validate_token(&token).is_ok());
                        // KID_2 may be retired between issuance and validation.
                        match auth.generate_token(KID_2, &claims) {
                            Ok(token) => {
                                if let Err(err) = auth.validate_token(&token) {
                                    assert!(matches!(err, AuthError::KeyLookupFailure { .. }));
                                }
                            }
                            Err(err) => assert!(matches!(err, AuthError::KeyNotFound(_))),
                        }
                    }
                });
            }
            s.spawn(|| {
                for _ in 0..200 {
                    auth.add_key(KID_2, rotating.clone());
                    auth.remove_key(KID_2);
                }
            });
        });

        assert_eq!(auth.keys().kids(), vec![KID_1.to_string()]);
    }
}
