//! Identity records returned by DID method clients and resolvers.
use serde::{Deserialize, Serialize};

/// DID document, reduced to what provisioning reads from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    pub id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<RecordKey>,
}

impl IdentityRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            keys: Vec::new(),
        }
    }

    pub fn key(&self, id: &str) -> Option<&RecordKey> {
        self.keys.iter().find(|key| key.id == id)
    }
}

/// Key of an [`IdentityRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordKey {
    /// Key id, usually `<did>#<fragment>`.
    pub id: String,

    #[serde(default)]
    pub purposes: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_base58: Option<String>,
}

impl RecordKey {
    pub fn has_purpose(&self, purpose: &str) -> bool {
        self.purposes.iter().any(|p| p == purpose)
    }
}
