//! Key management boundary.
//!
//! Private keys never leave the key manager once created or imported; the
//! provisioner only ever sees key identifiers and public key bytes.
use core::fmt;

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::key::KeyAlgorithm;

pub mod memory;

pub use memory::InMemoryKeyManager;

#[derive(Debug, thiserror::Error)]
pub enum KeyManagerError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("a key with id `{0}` already exists")]
    DuplicateKeyId(String),

    #[error("unsupported key algorithm `{0}`")]
    UnsupportedAlgorithm(KeyAlgorithm),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(#[from] InvalidPrivateKey),

    #[error("{0}")]
    Internal(String),
}

impl KeyManagerError {
    pub fn internal(e: impl ToString) -> Self {
        Self::Internal(e.to_string())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidPrivateKey {
    #[error("expected {expected} bytes of {algorithm} key material, found {found}")]
    Length {
        algorithm: KeyAlgorithm,
        expected: &'static str,
        found: usize,
    },

    #[error("{algorithm} secret key does not match its public key")]
    Inconsistent { algorithm: KeyAlgorithm },

    #[error("invalid {algorithm} scalar")]
    Scalar { algorithm: KeyAlgorithm },
}

/// Private key material handed to [`KeyManager::import_private_key`].
#[derive(Clone)]
pub enum PrivateKey {
    Ed25519(ed25519_dalek::SigningKey),
    P256(p256::SecretKey),
}

impl PrivateKey {
    /// Decodes Ed25519 key material, either a 32 bytes seed or the 64 bytes
    /// `seed || public key` form.
    pub fn ed25519_from_bytes(bytes: &[u8]) -> Result<Self, InvalidPrivateKey> {
        match bytes.len() {
            ed25519_dalek::SECRET_KEY_LENGTH => {
                let mut seed = Zeroizing::new([0u8; ed25519_dalek::SECRET_KEY_LENGTH]);
                seed.copy_from_slice(bytes);
                Ok(Self::Ed25519(ed25519_dalek::SigningKey::from_bytes(&seed)))
            }
            ed25519_dalek::KEYPAIR_LENGTH => {
                let mut keypair = Zeroizing::new([0u8; ed25519_dalek::KEYPAIR_LENGTH]);
                keypair.copy_from_slice(bytes);
                ed25519_dalek::SigningKey::from_keypair_bytes(&keypair)
                    .map(Self::Ed25519)
                    .map_err(|_| InvalidPrivateKey::Inconsistent {
                        algorithm: KeyAlgorithm::Ed25519,
                    })
            }
            found => Err(InvalidPrivateKey::Length {
                algorithm: KeyAlgorithm::Ed25519,
                expected: "32 or 64",
                found,
            }),
        }
    }

    pub fn p256_from_bytes(bytes: &[u8]) -> Result<Self, InvalidPrivateKey> {
        if bytes.len() != 32 {
            return Err(InvalidPrivateKey::Length {
                algorithm: KeyAlgorithm::P256,
                expected: "32",
                found: bytes.len(),
            });
        }

        p256::SecretKey::from_slice(bytes)
            .map(Self::P256)
            .map_err(|_| InvalidPrivateKey::Scalar {
                algorithm: KeyAlgorithm::P256,
            })
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            Self::Ed25519(_) => KeyAlgorithm::Ed25519,
            Self::P256(_) => KeyAlgorithm::P256,
        }
    }

    /// Public key bytes: the raw 32 bytes for Ed25519, the uncompressed SEC1
    /// point for P-256.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        use p256::elliptic_curve::sec1::ToEncodedPoint;
        match self {
            Self::Ed25519(key) => key.verifying_key().to_bytes().to_vec(),
            Self::P256(key) => key.public_key().to_encoded_point(false).as_bytes().to_vec(),
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({})", self.algorithm())
    }
}

/// Key material provider.
#[async_trait]
pub trait KeyManager: Send + Sync {
    /// Generates a new key pair and returns its identifier.
    async fn create(&self, algorithm: KeyAlgorithm) -> Result<String, KeyManagerError>;

    /// Public key bytes of the key pair `key_id`.
    async fn export_public_key(&self, key_id: &str) -> Result<Vec<u8>, KeyManagerError>;

    /// Stores an externally created private key.
    ///
    /// When `key_id` is given the key is addressed by it, otherwise the key
    /// manager picks an identifier. Returns the identifier.
    async fn import_private_key(
        &self,
        private_key: PrivateKey,
        key_id: Option<&str>,
    ) -> Result<String, KeyManagerError>;
}
