//! Provisioning orchestrator.
//!
//! A request is served by exactly one of three strategies:
//!
//! 1. [`Strategy::Registrar`]: a universal registrar driver creates the DID
//!    from a freshly generated key catalog.
//! 2. [`Strategy::Existing`]: an existing DID is resolved, and the caller's
//!    private key for it imported.
//! 3. [`Strategy::Local`]: the provisioner's own DID method client creates
//!    the DID from a freshly generated key catalog.
//!
//! Whichever strategy ran, canonical DIDs are qualified with the configured
//! domain before being returned.
use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::{
    catalog::{generate_key, KeyCatalog},
    config::ProvisionerConfig,
    did::DomainRewrite,
    error::ProvisioningError,
    key::{KeyAlgorithm, KeyId},
    kms::{KeyManager, PrivateKey},
    method::{LocalCreateRequest, LocalMethodClient},
    registrar::{
        reconcile, CreateRequest, Reconciled, RegisteredKey, RegistrarClient, RegistrarPublicKey,
        RegistrarRouting, ResponseShape,
    },
    resolution::Resolver,
    suite::SignatureSuite,
};

/// Provisioning request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningRequest {
    pub key_algorithm: KeyAlgorithm,

    pub signature_suite: SignatureSuite,

    /// DID to reuse instead of creating one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_did: Option<String>,

    /// Base58 private key of `key_id`, imported when reusing `existing_did`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_base58: Option<String>,

    /// Key reference returned as is when reusing `existing_did`. Must be
    /// `<did>#<fragment>` when `private_key_base58` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,

    /// Purpose of the key to pick out of a ledger registrar response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registrar: Option<RegistrarRouting>,
}

impl ProvisioningRequest {
    pub fn new(key_algorithm: KeyAlgorithm, signature_suite: SignatureSuite) -> Self {
        Self {
            key_algorithm,
            signature_suite,
            existing_did: None,
            private_key_base58: None,
            key_id: None,
            purpose: None,
            registrar: None,
        }
    }

    pub fn with_registrar(self, registrar: RegistrarRouting) -> Self {
        Self {
            registrar: Some(registrar),
            ..self
        }
    }

    pub fn with_purpose(self, purpose: impl Into<String>) -> Self {
        Self {
            purpose: Some(purpose.into()),
            ..self
        }
    }

    pub fn with_existing_did(self, did: impl Into<String>, key_id: Option<&str>) -> Self {
        Self {
            existing_did: Some(did.into()),
            key_id: key_id.map(str::to_owned),
            ..self
        }
    }

    pub fn with_private_key_base58(self, private_key: impl Into<String>) -> Self {
        Self {
            private_key_base58: Some(private_key.into()),
            ..self
        }
    }
}

/// Provisioning strategy, in order of precedence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy<'a> {
    Registrar(&'a RegistrarRouting),
    Existing(&'a str),
    Local,
}

impl<'a> Strategy<'a> {
    /// Registrar routing wins over an existing DID. Empty values count as
    /// absent.
    pub fn for_request(request: &'a ProvisioningRequest) -> Self {
        if let Some(routing) = request.registrar.as_ref().filter(|r| r.is_set()) {
            return Self::Registrar(routing);
        }

        match request.existing_did.as_deref() {
            Some(did) if !did.is_empty() => Self::Existing(did),
            _ => Self::Local,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Registrar(_) => "registrar",
            Self::Existing(_) => "existing DID",
            Self::Local => "local creation",
        }
    }
}

impl fmt::Display for Strategy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}

/// Provisioned DID and the reference of the key to sign with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedIdentity {
    pub did: String,

    /// `<did>#<key id>`. Absent only when an existing DID is reused without a
    /// key id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
}

/// DID provisioning orchestrator.
///
/// Holds no state besides its configuration and collaborators; requests may
/// be served concurrently.
#[derive(Clone)]
pub struct Provisioner {
    config: ProvisionerConfig,
    key_manager: Arc<dyn KeyManager>,
    registrar: Arc<dyn RegistrarClient>,
    method_client: Arc<dyn LocalMethodClient>,
    resolver: Arc<dyn Resolver>,
}

impl fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provisioner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Provisioner {
    pub fn new(
        config: ProvisionerConfig,
        key_manager: Arc<dyn KeyManager>,
        registrar: Arc<dyn RegistrarClient>,
        method_client: Arc<dyn LocalMethodClient>,
        resolver: Arc<dyn Resolver>,
    ) -> Self {
        Self {
            config,
            key_manager,
            registrar,
            method_client,
            resolver,
        }
    }

    pub fn config(&self) -> &ProvisionerConfig {
        &self.config
    }

    /// Serves `request` with the strategy it selects, then qualifies the
    /// resulting DID with the configured domain.
    pub async fn provision(
        &self,
        request: &ProvisioningRequest,
    ) -> Result<ProvisionedIdentity, ProvisioningError> {
        let strategy = Strategy::for_request(request);
        debug!(
            "provisioning {} key for {} using {} strategy",
            request.key_algorithm, request.signature_suite, strategy
        );

        let identity = match strategy {
            Strategy::Registrar(routing) => self.create_with_registrar(request, routing).await?,
            Strategy::Existing(did) => self.use_existing(did, request).await?,
            Strategy::Local => self.create_locally(request).await?,
        };

        let (did, key_id) = DomainRewrite::new(&self.config.canonical_method, &self.config.domain)
            .apply(&identity.did, identity.key_id.as_deref());

        info!("provisioned `{}`", did);
        Ok(ProvisionedIdentity { did, key_id })
    }

    /// Builds the key catalog and the recovery and update keys, in that
    /// order, and picks the key matching the request.
    async fn prepare_keys(
        &self,
        request: &ProvisioningRequest,
    ) -> Result<PreparedKeys, ProvisioningError> {
        let key_manager = self.key_manager.as_ref();
        let catalog = KeyCatalog::build(key_manager, &self.config.catalog).await?;
        let selected_key_id = catalog
            .select_primary_key(
                &self.config.signature_suites,
                request.key_algorithm,
                request.signature_suite,
            )?
            .id
            .clone();

        let (_, recovery_public_key) = generate_key(key_manager, KeyAlgorithm::Ed25519).await?;
        let (_, update_public_key) = generate_key(key_manager, KeyAlgorithm::Ed25519).await?;

        Ok(PreparedKeys {
            catalog,
            selected_key_id,
            recovery_public_key,
            update_public_key,
        })
    }

    /// Creates a DID through the registrar driver at `routing`.
    ///
    /// The returned DID is not domain qualified.
    pub async fn create_with_registrar(
        &self,
        request: &ProvisioningRequest,
        routing: &RegistrarRouting,
    ) -> Result<ProvisionedIdentity, ProvisioningError> {
        let keys = self.prepare_keys(request).await?;

        let mut public_keys: Vec<RegistrarPublicKey> =
            keys.catalog.keys().iter().map(RegistrarPublicKey::from).collect();
        public_keys.push(RegistrarPublicKey::recovery(keys.recovery_public_key));
        public_keys.push(RegistrarPublicKey::update(keys.update_public_key));

        let response = self
            .registrar
            .create_did(
                &routing.driver_url,
                CreateRequest {
                    public_keys,
                    options: routing.options.clone(),
                },
            )
            .await
            .map_err(|source| ProvisioningError::RegistrarCall {
                driver_url: routing.driver_url.clone(),
                source,
            })?;

        let shape = ResponseShape::classify(
            &response.identifier,
            &self.config.canonical_method,
            &self.config.alternate_method,
        );
        debug!(
            "registrar created `{}` with {} keys ({:?} response)",
            response.identifier,
            response.keys.len(),
            shape
        );

        let key_id = match reconcile(
            shape,
            &response.keys,
            &keys.selected_key_id,
            request.purpose.as_deref(),
        )? {
            Reconciled::Submitted(key) => key.id.clone(),
            Reconciled::Generated(key) => {
                if shape == ResponseShape::Unrecognized {
                    warn!(
                        "importing first key `{}` returned for `{}`, it was not matched against {} / {}",
                        key.id, response.identifier, request.key_algorithm, request.signature_suite
                    );
                }
                self.import_registered_key(key).await?
            }
        };

        Ok(ProvisionedIdentity {
            did: response.identifier,
            key_id: Some(key_id),
        })
    }

    async fn import_registered_key(&self, key: &RegisteredKey) -> Result<String, ProvisioningError> {
        let key_id: KeyId = key.id.parse()?;
        let encoded = key
            .private_key_base58
            .as_deref()
            .ok_or_else(|| ProvisioningError::MissingPrivateKey(key.id.clone()))?;
        let private_key = decode_private_key(&key_id, encoded)?;

        self.import_private_key(&key_id, KeyAlgorithm::Ed25519, &private_key)
            .await?;
        Ok(key_id.into_string())
    }

    /// Resolves `did` and imports the caller's private key, if any.
    ///
    /// Caller keys are Ed25519 whatever the requested algorithm. The key
    /// reference is the caller's key id as given.
    pub async fn use_existing(
        &self,
        did: &str,
        request: &ProvisioningRequest,
    ) -> Result<ProvisionedIdentity, ProvisioningError> {
        let record = self
            .resolver
            .resolve(did)
            .await
            .map_err(|source| ProvisioningError::Resolution {
                did: did.to_owned(),
                source,
            })?;
        debug!("resolved `{}`", record.id);

        if let Some(encoded) = request.private_key_base58.as_deref() {
            let key_id: KeyId = request
                .key_id
                .as_deref()
                .ok_or(ProvisioningError::MissingKeyId)?
                .parse()?;
            let private_key = decode_private_key(&key_id, encoded)?;
            self.import_private_key(&key_id, KeyAlgorithm::Ed25519, &private_key)
                .await?;
        }

        Ok(ProvisionedIdentity {
            did: record.id,
            key_id: request.key_id.clone(),
        })
    }

    /// Creates a DID in the configured domain with the local method client.
    ///
    /// The key reference is always `<created DID>#<selected key id>`.
    pub async fn create_locally(
        &self,
        request: &ProvisioningRequest,
    ) -> Result<ProvisionedIdentity, ProvisioningError> {
        let keys = self.prepare_keys(request).await?;

        let record = self
            .method_client
            .create_did(
                &self.config.domain,
                LocalCreateRequest {
                    public_keys: keys.catalog.into_keys(),
                    recovery_public_key: keys.recovery_public_key,
                    update_public_key: keys.update_public_key,
                },
            )
            .await
            .map_err(|source| ProvisioningError::LocalCreation {
                domain: self.config.domain.clone(),
                source,
            })?;

        let key_id = format!("{}#{}", record.id, keys.selected_key_id);
        Ok(ProvisionedIdentity {
            did: record.id,
            key_id: Some(key_id),
        })
    }

    /// Imports `private_key` into the key manager under the fragment of
    /// `key_id`.
    ///
    /// Only Ed25519 keys can be imported.
    pub async fn import_private_key(
        &self,
        key_id: &KeyId,
        algorithm: KeyAlgorithm,
        private_key: &[u8],
    ) -> Result<(), ProvisioningError> {
        if algorithm != KeyAlgorithm::Ed25519 {
            return Err(ProvisioningError::UnsupportedImportAlgorithm(algorithm));
        }

        let private_key = PrivateKey::ed25519_from_bytes(private_key).map_err(|source| {
            ProvisioningError::InvalidPrivateKey {
                key_id: key_id.to_string(),
                source,
            }
        })?;

        self.key_manager
            .import_private_key(private_key, Some(key_id.suffix()))
            .await
            .map_err(|source| ProvisioningError::Import {
                key_id: key_id.to_string(),
                source,
            })?;

        debug!("imported private key `{}`", key_id);
        Ok(())
    }
}

struct PreparedKeys {
    catalog: KeyCatalog,
    selected_key_id: String,
    recovery_public_key: Vec<u8>,
    update_public_key: Vec<u8>,
}

fn decode_private_key(key_id: &KeyId, encoded: &str) -> Result<Zeroizing<Vec<u8>>, ProvisioningError> {
    bs58::decode(encoded)
        .into_vec()
        .map(Zeroizing::new)
        .map_err(|source| ProvisioningError::PrivateKeyEncoding {
            key_id: key_id.to_string(),
            source,
        })
}
