//! Signature suites and the verification key type each one requires.
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::key::VerificationType;

/// Linked Data proof suite a caller intends to sign with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureSuite {
    /// <https://w3c-ccg.github.io/lds-ed25519-2018/>
    Ed25519Signature2018,

    /// <https://w3c-ccg.github.io/lds-jws2020/>
    JsonWebSignature2020,

    /// <https://w3c-ccg.github.io/lds-ecdsa-secp256k1-2019/>
    EcdsaSecp256k1Signature2019,

    /// <https://w3c-ccg.github.io/ldp-bbs2020/>
    BbsBlsSignature2020,
}

impl SignatureSuite {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ed25519Signature2018 => "Ed25519Signature2018",
            Self::JsonWebSignature2020 => "JsonWebSignature2020",
            Self::EcdsaSecp256k1Signature2019 => "EcdsaSecp256k1Signature2019",
            Self::BbsBlsSignature2020 => "BbsBlsSignature2020",
        }
    }
}

impl fmt::Display for SignatureSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}

/// Mapping from signature suite to the verification key type it requires.
///
/// Suites without an entry map to nothing, which no key ever satisfies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureSuiteMap(Vec<(SignatureSuite, VerificationType)>);

impl SignatureSuiteMap {
    pub fn new(entries: Vec<(SignatureSuite, VerificationType)>) -> Self {
        Self(entries)
    }

    pub fn get(&self, suite: SignatureSuite) -> Option<VerificationType> {
        self.0
            .iter()
            .find(|(s, _)| *s == suite)
            .map(|(_, verification_type)| *verification_type)
    }

    pub fn contains(&self, suite: SignatureSuite) -> bool {
        self.get(suite).is_some()
    }
}

impl Default for SignatureSuiteMap {
    fn default() -> Self {
        Self(vec![
            (
                SignatureSuite::Ed25519Signature2018,
                VerificationType::Ed25519VerificationKey2018,
            ),
            (
                SignatureSuite::JsonWebSignature2020,
                VerificationType::JwsVerificationKey2020,
            ),
        ])
    }
}
