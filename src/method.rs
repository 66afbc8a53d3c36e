//! Client of the provisioner's own DID method, used when no registrar is
//! configured.
use async_trait::async_trait;

use crate::{document::IdentityRecord, key::KeyDescriptor};

#[derive(Debug, thiserror::Error)]
pub enum MethodClientError {
    #[error("unable to reach domain `{0}`")]
    Unreachable(String),

    #[error("DID document rejected: {0}")]
    Rejected(String),

    #[error("{0}")]
    Internal(String),
}

impl MethodClientError {
    pub fn internal(e: impl ToString) -> Self {
        Self::Internal(e.to_string())
    }
}

/// Keys of a DID document to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalCreateRequest {
    pub public_keys: Vec<KeyDescriptor>,

    /// Ed25519 public key authorizing recovery operations.
    pub recovery_public_key: Vec<u8>,

    /// Ed25519 public key authorizing update operations.
    pub update_public_key: Vec<u8>,
}

#[async_trait]
pub trait LocalMethodClient: Send + Sync {
    /// Creates a DID in `domain` and returns its document.
    async fn create_did(
        &self,
        domain: &str,
        request: LocalCreateRequest,
    ) -> Result<IdentityRecord, MethodClientError>;
}
