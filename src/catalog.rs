//! Key catalog: the set of keys published in every new DID document, and the
//! selection of the key the caller will sign with.
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    error::ProvisioningError,
    key::{KeyAlgorithm, KeyDescriptor, KeyPurpose, PublicKeyEncoding, VerificationType},
    kms::{KeyManager, KeyManagerError},
    suite::{SignatureSuite, SignatureSuiteMap},
};

/// One key of the catalog policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub key_algorithm: KeyAlgorithm,
    pub verification_type: VerificationType,
    #[serde(default)]
    pub encoding: PublicKeyEncoding,
}

impl CatalogEntry {
    pub const fn new(key_algorithm: KeyAlgorithm, verification_type: VerificationType) -> Self {
        Self {
            key_algorithm,
            verification_type,
            encoding: PublicKeyEncoding::Jwk,
        }
    }
}

/// Ordered list of keys to generate for every new DID document.
///
/// Order is significant: it is the order of the keys in the document and the
/// tie-break order of [`KeyCatalog::select_primary_key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogPolicy(Vec<CatalogEntry>);

impl CatalogPolicy {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.0
    }
}

impl Default for CatalogPolicy {
    fn default() -> Self {
        Self(vec![
            CatalogEntry::new(
                KeyAlgorithm::Ed25519,
                VerificationType::Ed25519VerificationKey2018,
            ),
            CatalogEntry::new(KeyAlgorithm::Ed25519, VerificationType::JwsVerificationKey2020),
            CatalogEntry::new(KeyAlgorithm::P256, VerificationType::JwsVerificationKey2020),
        ])
    }
}

/// Keys generated for one provisioning attempt.
#[derive(Debug, Clone)]
pub struct KeyCatalog {
    keys: Vec<KeyDescriptor>,
}

impl KeyCatalog {
    /// Generates one key pair per policy entry.
    ///
    /// Stops at the first key manager failure. Keys generated before the
    /// failure stay in the key manager.
    pub async fn build(
        key_manager: &dyn KeyManager,
        policy: &CatalogPolicy,
    ) -> Result<Self, ProvisioningError> {
        let mut keys = Vec::with_capacity(policy.entries().len());

        for entry in policy.entries() {
            let (id, public_key) = generate_key(key_manager, entry.key_algorithm).await?;
            debug!(
                "generated {} key `{}` for {}",
                entry.key_algorithm, id, entry.verification_type
            );
            keys.push(KeyDescriptor {
                id,
                verification_type: entry.verification_type,
                key_algorithm: entry.key_algorithm,
                encoding: entry.encoding,
                public_key,
                purposes: KeyPurpose::ALL.to_vec(),
            });
        }

        Ok(Self { keys })
    }

    /// First key of the catalog with the requested algorithm and the
    /// verification type `suites` associates with `signature_suite`.
    pub fn select_primary_key(
        &self,
        suites: &SignatureSuiteMap,
        key_algorithm: KeyAlgorithm,
        signature_suite: SignatureSuite,
    ) -> Result<&KeyDescriptor, ProvisioningError> {
        let no_match = || ProvisioningError::NoMatchingKey {
            key_algorithm,
            signature_suite,
        };

        let verification_type = suites.get(signature_suite).ok_or_else(no_match)?;

        self.keys
            .iter()
            .find(|key| key.matches(key_algorithm, verification_type))
            .ok_or_else(no_match)
    }

    pub fn keys(&self) -> &[KeyDescriptor] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn into_keys(self) -> Vec<KeyDescriptor> {
        self.keys
    }
}

/// Creates a key pair and exports its public key.
pub async fn generate_key(
    key_manager: &dyn KeyManager,
    algorithm: KeyAlgorithm,
) -> Result<(String, Vec<u8>), ProvisioningError> {
    let wrap = |source: KeyManagerError| ProvisioningError::KeyGeneration { algorithm, source };

    let key_id = key_manager.create(algorithm).await.map_err(wrap)?;
    let public_key = key_manager
        .export_public_key(&key_id)
        .await
        .map_err(wrap)?;

    Ok((key_id, public_key))
}
