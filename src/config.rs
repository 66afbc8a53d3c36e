use serde::{Deserialize, Serialize};

use crate::{catalog::CatalogPolicy, suite::SignatureSuiteMap};

pub const DEFAULT_CANONICAL_METHOD: &str = "did:trustbloc";

pub const DEFAULT_ALTERNATE_METHOD: &str = "did:v1";

/// Provisioner settings, fixed for the lifetime of a
/// [`Provisioner`](crate::Provisioner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionerConfig {
    /// Domain inserted into canonical DIDs, and where local DIDs are created.
    pub domain: String,

    /// Prefix of the provisioner's own DID method.
    #[serde(default = "default_canonical_method")]
    pub canonical_method: String,

    /// Prefix of the ledger method whose registrar generates keys itself.
    #[serde(default = "default_alternate_method")]
    pub alternate_method: String,

    #[serde(default)]
    pub signature_suites: SignatureSuiteMap,

    #[serde(default)]
    pub catalog: CatalogPolicy,
}

fn default_canonical_method() -> String {
    DEFAULT_CANONICAL_METHOD.to_owned()
}

fn default_alternate_method() -> String {
    DEFAULT_ALTERNATE_METHOD.to_owned()
}

impl ProvisionerConfig {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            canonical_method: default_canonical_method(),
            alternate_method: default_alternate_method(),
            signature_suites: SignatureSuiteMap::default(),
            catalog: CatalogPolicy::default(),
        }
    }
}
