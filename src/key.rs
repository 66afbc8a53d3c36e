//! Key vocabulary shared by the catalog, the collaborators and the
//! orchestrator.
use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Key pair algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    Ed25519,
    P256,
}

impl KeyAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ed25519 => "Ed25519",
            Self::P256 => "P256",
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}

/// Verification method type a published key is declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationType {
    /// <https://w3c-ccg.github.io/lds-ed25519-2018/>
    Ed25519VerificationKey2018,

    /// <https://w3c-ccg.github.io/lds-jws2020/>
    JwsVerificationKey2020,
}

impl VerificationType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ed25519VerificationKey2018 => "Ed25519VerificationKey2018",
            Self::JwsVerificationKey2020 => "JwsVerificationKey2020",
        }
    }
}

impl fmt::Display for VerificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}

/// Encoding of the public key value inside the DID document.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PublicKeyEncoding {
    #[default]
    Jwk,
    Base58,
}

/// Verification relationship of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyPurpose {
    VerificationMethod,
    AssertionMethod,
    Authentication,
}

impl KeyPurpose {
    pub const ALL: [Self; 3] = [
        Self::VerificationMethod,
        Self::AssertionMethod,
        Self::Authentication,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::VerificationMethod => "verificationMethod",
            Self::AssertionMethod => "assertionMethod",
            Self::Authentication => "authentication",
        }
    }
}

/// Public key published in a new DID document.
///
/// `id` is the key manager identifier of the key pair, which also becomes the
/// fragment of the verification method once the document exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDescriptor {
    pub id: String,
    pub verification_type: VerificationType,
    pub key_algorithm: KeyAlgorithm,
    pub encoding: PublicKeyEncoding,
    #[serde(with = "base64_bytes")]
    pub public_key: Vec<u8>,
    pub purposes: Vec<KeyPurpose>,
}

impl KeyDescriptor {
    pub fn matches(&self, algorithm: KeyAlgorithm, verification_type: VerificationType) -> bool {
        self.key_algorithm == algorithm && self.verification_type == verification_type
    }
}

/// Reference to a key of a DID document, `<did>#<suffix>`.
///
/// The suffix is the identifier under which the private key lives in the key
/// manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyId {
    value: String,
    separator: usize,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidKeyId {
    #[error("missing `#` in key id `{0}`")]
    MissingFragment(String),

    #[error("more than one `#` in key id `{0}`")]
    MultipleFragments(String),

    #[error("empty fragment in key id `{0}`")]
    EmptyFragment(String),
}

impl KeyId {
    pub fn new(did: &str, suffix: &str) -> Result<Self, InvalidKeyId> {
        format!("{did}#{suffix}").try_into()
    }

    /// Part before the `#`.
    pub fn did(&self) -> &str {
        &self.value[..self.separator]
    }

    /// Part after the `#`.
    pub fn suffix(&self) -> &str {
        &self.value[self.separator + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }
}

impl TryFrom<String> for KeyId {
    type Error = InvalidKeyId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let Some(separator) = value.find('#') else {
            return Err(InvalidKeyId::MissingFragment(value));
        };

        if value[separator + 1..].contains('#') {
            return Err(InvalidKeyId::MultipleFragments(value));
        }

        if separator + 1 == value.len() {
            return Err(InvalidKeyId::EmptyFragment(value));
        }

        Ok(Self { value, separator })
    }
}

impl FromStr for KeyId {
    type Err = InvalidKeyId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.to_owned().try_into()
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl Serialize for KeyId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for KeyId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.try_into().map_err(serde::de::Error::custom)
    }
}

pub(crate) mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
