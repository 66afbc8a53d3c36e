use crate::{
    key::{InvalidKeyId, KeyAlgorithm},
    kms::{InvalidPrivateKey, KeyManagerError},
    method::MethodClientError,
    registrar::RegistrarError,
    resolution::ResolutionError,
    suite::SignatureSuite,
};

/// Provisioning failure.
///
/// Every variant is terminal for the request that produced it.
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    #[error("key manager failed to generate {algorithm} key: {source}")]
    KeyGeneration {
        algorithm: KeyAlgorithm,
        #[source]
        source: KeyManagerError,
    },

    #[error("no key found to match key type: {key_algorithm} and signature type: {signature_suite}")]
    NoMatchingKey {
        key_algorithm: KeyAlgorithm,
        signature_suite: SignatureSuite,
    },

    #[error("resolver failed to resolve DID `{did}`: {source}")]
    Resolution {
        did: String,
        #[source]
        source: ResolutionError,
    },

    #[error("registrar at `{driver_url}` failed to create DID: {source}")]
    RegistrarCall {
        driver_url: String,
        #[source]
        source: RegistrarError,
    },

    #[error("DID method client failed to create DID in domain `{domain}`: {source}")]
    LocalCreation {
        domain: String,
        #[source]
        source: MethodClientError,
    },

    #[error("selected key not found: {0}")]
    SelectedKeyNotFound(String),

    #[error("registrar returned no key with purpose `{0}`")]
    NoKeyForPurpose(String),

    #[error("registrar returned no keys")]
    NoKeysReturned,

    #[error("import key type not supported: {0}")]
    UnsupportedImportAlgorithm(KeyAlgorithm),

    #[error("key manager failed to import private key `{key_id}`: {source}")]
    Import {
        key_id: String,
        #[source]
        source: KeyManagerError,
    },

    #[error(transparent)]
    InvalidKeyId(#[from] InvalidKeyId),

    #[error("private key supplied without a key id")]
    MissingKeyId,

    #[error("missing private key for `{0}`")]
    MissingPrivateKey(String),

    #[error("private key for `{key_id}` is not valid base58: {source}")]
    PrivateKeyEncoding {
        key_id: String,
        #[source]
        source: bs58::decode::Error,
    },

    #[error("invalid private key for `{key_id}`: {source}")]
    InvalidPrivateKey {
        key_id: String,
        #[source]
        source: InvalidPrivateKey,
    },
}

impl ProvisioningError {
    /// Name of the collaborator whose failure this error wraps, if any.
    pub fn collaborator(&self) -> Option<&'static str> {
        match self {
            Self::KeyGeneration { .. } | Self::Import { .. } => Some("key manager"),
            Self::Resolution { .. } => Some("resolver"),
            Self::RegistrarCall { .. } => Some("registrar"),
            Self::LocalCreation { .. } => Some("DID method client"),
            _ => None,
        }
    }
}
