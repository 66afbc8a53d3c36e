//! Universal registrar collaborator and reconciliation of its responses.
//!
//! Registrar drivers for different DID methods do not agree on which keys end
//! up in the created document. The response is classified by the method of
//! the returned DID ([`ResponseShape`]) and the key the caller will use is
//! picked accordingly ([`reconcile`]).
use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::ProvisioningError,
    key::{base64_bytes, KeyAlgorithm, KeyDescriptor, KeyPurpose, PublicKeyEncoding, VerificationType},
};

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::HttpRegistrarClient;

/// Where and how to reach a registrar driver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrarRouting {
    #[serde(rename = "driverURL")]
    pub driver_url: String,

    /// Method specific options, passed through to the driver.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub options: HashMap<String, Value>,
}

impl RegistrarRouting {
    pub fn new(driver_url: impl Into<String>) -> Self {
        Self {
            driver_url: driver_url.into(),
            options: HashMap::new(),
        }
    }

    pub fn is_set(&self) -> bool {
        !self.driver_url.is_empty()
    }
}

/// Public key submitted to the registrar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrarPublicKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub verification_type: Option<VerificationType>,

    /// Public key bytes, base64 encoded on the wire.
    #[serde(with = "base64_bytes")]
    pub value: Vec<u8>,

    pub key_type: KeyAlgorithm,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<PublicKeyEncoding>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub purposes: Vec<KeyPurpose>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub recovery: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub update: bool,
}

impl RegistrarPublicKey {
    fn bare(key_type: KeyAlgorithm, value: Vec<u8>) -> Self {
        Self {
            id: None,
            verification_type: None,
            value,
            key_type,
            encoding: None,
            purposes: Vec::new(),
            recovery: false,
            update: false,
        }
    }

    /// Ed25519 recovery key.
    pub fn recovery(value: Vec<u8>) -> Self {
        Self {
            recovery: true,
            ..Self::bare(KeyAlgorithm::Ed25519, value)
        }
    }

    /// Ed25519 update key.
    pub fn update(value: Vec<u8>) -> Self {
        Self {
            update: true,
            ..Self::bare(KeyAlgorithm::Ed25519, value)
        }
    }
}

impl From<&KeyDescriptor> for RegistrarPublicKey {
    fn from(key: &KeyDescriptor) -> Self {
        Self {
            id: Some(key.id.clone()),
            verification_type: Some(key.verification_type),
            value: key.public_key.clone(),
            key_type: key.key_algorithm,
            encoding: Some(key.encoding),
            purposes: key.purposes.clone(),
            recovery: false,
            update: false,
        }
    }
}

/// DID creation request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateRequest {
    /// Catalog keys followed by the recovery and update keys.
    pub public_keys: Vec<RegistrarPublicKey>,
    pub options: HashMap<String, Value>,
}

/// Key materialized by the registrar in the created document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredKey {
    pub id: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub key_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,

    #[serde(default)]
    pub purposes: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_base58: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_base58: Option<String>,
}

impl RegisteredKey {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key_type: None,
            controller: None,
            purposes: Vec::new(),
            public_key_base58: None,
            private_key_base58: None,
        }
    }

    pub fn has_purpose(&self, purpose: &str) -> bool {
        self.purposes.iter().any(|p| p == purpose)
    }
}

/// Outcome of a DID creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateResponse {
    pub identifier: String,
    pub keys: Vec<RegisteredKey>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrarError {
    #[error("HTTP client creation failed: {0}")]
    HttpClient(String),

    #[error("unable to send HTTP request: {0}")]
    HttpRequest(String),

    #[error("server returned an error ({status}): {body}")]
    HttpServer { status: u16, body: String },

    #[error("unable to read HTTP response: {0}")]
    HttpResponse(String),

    #[error("unable to parse registration state: {0}")]
    Json(String),

    #[error("DID creation ended in state `{state}`: {}", .reason.as_deref().unwrap_or("no reason given"))]
    NotFinished {
        state: String,
        reason: Option<String>,
    },

    #[error("{0}")]
    Internal(String),
}

impl RegistrarError {
    pub fn internal(e: impl ToString) -> Self {
        Self::Internal(e.to_string())
    }
}

/// Universal registrar client.
#[async_trait]
pub trait RegistrarClient: Send + Sync {
    async fn create_did(
        &self,
        driver_url: &str,
        request: CreateRequest,
    ) -> Result<CreateResponse, RegistrarError>;
}

/// Kind of registrar driver that produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// DID of the provisioner's own method. The driver publishes the
    /// submitted keys, private keys never leave the key manager.
    Canonical,

    /// Ledger method whose driver generates its own keys and hands back the
    /// private keys, tagged with purposes.
    AlternateLedger,

    /// Any other driver. Such drivers do not accept submitted keys.
    Unrecognized,
}

impl ResponseShape {
    pub fn classify(identifier: &str, canonical_prefix: &str, alternate_prefix: &str) -> Self {
        if identifier.starts_with(canonical_prefix) {
            Self::Canonical
        } else if identifier.starts_with(alternate_prefix) {
            Self::AlternateLedger
        } else {
            Self::Unrecognized
        }
    }
}

/// Key picked out of a registrar response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled<'a> {
    /// Key submitted by the provisioner, its private key is already managed.
    Submitted(&'a RegisteredKey),

    /// Key generated by the driver, its private key must be imported.
    Generated(&'a RegisteredKey),
}

impl<'a> Reconciled<'a> {
    pub fn key(&self) -> &'a RegisteredKey {
        match self {
            Self::Submitted(key) | Self::Generated(key) => key,
        }
    }
}

/// Picks the key the caller will use out of the keys a registrar returned.
///
/// - [`ResponseShape::Canonical`]: the key whose id ends with
///   `#<selected_key_id>`.
/// - [`ResponseShape::AlternateLedger`]: the first key with `purpose`.
/// - [`ResponseShape::Unrecognized`]: the first key.
pub fn reconcile<'a>(
    shape: ResponseShape,
    keys: &'a [RegisteredKey],
    selected_key_id: &str,
    purpose: Option<&str>,
) -> Result<Reconciled<'a>, ProvisioningError> {
    match shape {
        ResponseShape::Canonical => {
            let fragment = format!("#{selected_key_id}");
            keys.iter()
                .find(|key| key.id.ends_with(&fragment))
                .map(Reconciled::Submitted)
                .ok_or_else(|| ProvisioningError::SelectedKeyNotFound(selected_key_id.to_owned()))
        }
        ResponseShape::AlternateLedger => purpose
            .and_then(|purpose| keys.iter().find(|key| key.has_purpose(purpose)))
            .map(Reconciled::Generated)
            .ok_or_else(|| ProvisioningError::NoKeyForPurpose(purpose.unwrap_or_default().to_owned())),
        ResponseShape::Unrecognized => keys
            .first()
            .map(Reconciled::Generated)
            .ok_or(ProvisioningError::NoKeysReturned),
    }
}
