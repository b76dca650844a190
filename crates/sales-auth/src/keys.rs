//! In-memory store of private signing keys, addressed by key id (KID).
//!
//! During key rotation the old and the new key live side by side under
//! distinct KIDs. Readers (token issuance) and writers (rotation) may run
//! concurrently; the map sits behind a read-write lock and is never exposed.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use jsonwebtoken::{DecodingKey, EncodingKey};

/// Thread-safe KID to private key mapping.
#[derive(Default)]
pub struct KeyStore {
    keys: RwLock<HashMap<String, Arc<EncodingKey>>>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the key for `kid`, replacing any previous entry.
    pub fn add(&self, kid: impl Into<String>, key: EncodingKey) {
        self.write().insert(kid.into(), Arc::new(key));
    }

    /// Removes the key for `kid`. Returns whether an entry existed.
    pub fn remove(&self, kid: &str) -> bool {
        self.write().remove(kid).is_some()
    }

    /// Returns the key registered for `kid`, if any.
    pub fn get(&self, kid: &str) -> Option<Arc<EncodingKey>> {
        self.read().get(kid).cloned()
    }

    pub fn contains(&self, kid: &str) -> bool {
        self.read().contains_key(kid)
    }

    /// Active KIDs, sorted.
    pub fn kids(&self) -> Vec<String> {
        let mut kids: Vec<String> = self.read().keys().cloned().collect();
        kids.sort();
        kids
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panic while holding the lock cannot leave the map half-written:
    // every mutation is a single insert or remove.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<EncodingKey>>> {
        self.keys.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<EncodingKey>>> {
        self.keys.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore").field("kids", &self.kids()).finish()
    }
}

impl<K: Into<String>> FromIterator<(K, EncodingKey)> for KeyStore {
    fn from_iter<I: IntoIterator<Item = (K, EncodingKey)>>(iter: I) -> Self {
        let keys = iter
            .into_iter()
            .map(|(kid, key)| (kid.into(), Arc::new(key)))
            .collect();
        Self {
            keys: RwLock::new(keys),
        }
    }
}

/// Parses an RSA private key (PKCS#1 or PKCS#8 PEM).
pub fn private_key_from_pem(pem: &[u8]) -> Result<EncodingKey, jsonwebtoken::errors::Error> {
    EncodingKey::from_rsa_pem(pem)
}

/// Parses an RSA public key (PKCS#1 or SubjectPublicKeyInfo PEM).
pub fn public_key_from_pem(pem: &[u8]) -> Result<DecodingKey, jsonwebtoken::errors::Error> {
    DecodingKey::from_rsa_pem(pem)
}
