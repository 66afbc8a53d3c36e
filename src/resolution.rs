//! DID resolution.
use std::collections::HashMap;

use async_trait::async_trait;

use crate::document::IdentityRecord;

#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("DID not found")]
    NotFound,

    #[error("invalid DID `{0}`")]
    InvalidDid(String),

    #[error("DID method `{0}` not supported")]
    MethodNotSupported(String),

    #[error("{0}")]
    Internal(String),
}

impl ResolutionError {
    pub fn internal(e: impl ToString) -> Self {
        Self::Internal(e.to_string())
    }
}

/// Resolves an existing DID to its document.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, did: &str) -> Result<IdentityRecord, ResolutionError>;
}

/// Resolver over a fixed set of records.
#[derive(Debug, Default, Clone)]
pub struct StaticResolver {
    map: HashMap<String, IdentityRecord>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Adds `record` under its own id.
    pub fn insert(&mut self, record: IdentityRecord) -> Option<IdentityRecord> {
        self.map.insert(record.id.clone(), record)
    }
}

impl FromIterator<IdentityRecord> for StaticResolver {
    fn from_iter<T: IntoIterator<Item = IdentityRecord>>(iter: T) -> Self {
        let mut resolver = Self::new();
        for record in iter {
            resolver.insert(record);
        }
        resolver
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn resolve(&self, did: &str) -> Result<IdentityRecord, ResolutionError> {
        if !did.starts_with("did:") {
            return Err(ResolutionError::InvalidDid(did.to_owned()));
        }

        match self.map.get(did) {
            Some(record) => Ok(record.clone()),
            None => Err(ResolutionError::NotFound),
        }
    }
}
