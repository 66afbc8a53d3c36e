//! In-memory key manager.
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};

use super::{KeyManager, KeyManagerError, PrivateKey};
use crate::key::KeyAlgorithm;

fn handle_poison<T>(_err: PoisonError<T>) -> KeyManagerError {
    KeyManagerError::internal("key store lock poisoned")
}

/// Non-persistent key manager.
///
/// Key identifiers are 32 random bytes, base64url encoded. Clones share the
/// same key store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKeyManager {
    keys: Arc<RwLock<HashMap<String, PrivateKey>>>,
}

impl InMemoryKeyManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.read().map(|keys| keys.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key_id: &str) -> bool {
        self.keys
            .read()
            .map(|keys| keys.contains_key(key_id))
            .unwrap_or_default()
    }

    /// Algorithm of the stored key `key_id`.
    pub fn algorithm(&self, key_id: &str) -> Option<KeyAlgorithm> {
        self.keys
            .read()
            .ok()?
            .get(key_id)
            .map(PrivateKey::algorithm)
    }

    fn insert(&self, key_id: String, key: PrivateKey) -> Result<String, KeyManagerError> {
        let mut keys = self.keys.write().map_err(handle_poison)?;
        if keys.contains_key(&key_id) {
            return Err(KeyManagerError::DuplicateKeyId(key_id));
        }
        keys.insert(key_id.clone(), key);
        Ok(key_id)
    }
}

fn random_key_id() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn generate(algorithm: KeyAlgorithm) -> PrivateKey {
    let mut rng = OsRng;
    match algorithm {
        KeyAlgorithm::Ed25519 => PrivateKey::Ed25519(ed25519_dalek::SigningKey::generate(&mut rng)),
        KeyAlgorithm::P256 => PrivateKey::P256(p256::SecretKey::random(&mut rng)),
    }
}

#[async_trait]
impl KeyManager for InMemoryKeyManager {
    async fn create(&self, algorithm: KeyAlgorithm) -> Result<String, KeyManagerError> {
        self.insert(random_key_id(), generate(algorithm))
    }

    async fn export_public_key(&self, key_id: &str) -> Result<Vec<u8>, KeyManagerError> {
        self.keys
            .read()
            .map_err(handle_poison)?
            .get(key_id)
            .map(PrivateKey::public_key_bytes)
            .ok_or_else(|| KeyManagerError::NotFound(key_id.to_owned()))
    }

    async fn import_private_key(
        &self,
        private_key: PrivateKey,
        key_id: Option<&str>,
    ) -> Result<String, KeyManagerError> {
        let key_id = key_id.map(str::to_owned).unwrap_or_else(random_key_id);
        self.insert(key_id, private_key)
    }
}
