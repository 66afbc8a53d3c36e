//! Provisioning of Decentralized Identifiers (DIDs) backed by managed key
//! material.
//!
//! A [`Provisioner`] turns a [`ProvisioningRequest`] (key algorithm, signature
//! suite and optional routing information) into a DID and the reference of
//! the key the caller should sign with. Depending on the request, the DID is
//! created through a [universal registrar][registrar] driver, created with the
//! provisioner's own DID method client, or an existing DID is reused.
//!
//! The provisioner delegates every side effect to four collaborators:
//! - a [`KeyManager`], holding every private key;
//! - a [`RegistrarClient`], such as [`HttpRegistrarClient`];
//! - a [`LocalMethodClient`] for the provisioner's own DID method;
//! - a [`Resolver`], such as [`StaticResolver`].
//!
//! [registrar]: <https://identity.foundation/did-registration/>
//!
//! # Usage
//!
//! ```
//! # async fn provision(
//! #     registrar: std::sync::Arc<dyn did_provisioner::RegistrarClient>,
//! #     method_client: std::sync::Arc<dyn did_provisioner::LocalMethodClient>,
//! # ) -> Result<(), did_provisioner::ProvisioningError> {
//! use std::sync::Arc;
//! use did_provisioner::{
//!     InMemoryKeyManager, KeyAlgorithm, Provisioner, ProvisionerConfig, ProvisioningRequest,
//!     SignatureSuite, StaticResolver,
//! };
//!
//! let provisioner = Provisioner::new(
//!     ProvisionerConfig::new("example.com"),
//!     Arc::new(InMemoryKeyManager::new()),
//!     registrar,
//!     method_client,
//!     Arc::new(StaticResolver::new()),
//! );
//!
//! let identity = provisioner
//!     .provision(&ProvisioningRequest::new(
//!         KeyAlgorithm::Ed25519,
//!         SignatureSuite::Ed25519Signature2018,
//!     ))
//!     .await?;
//! println!("{} signs with {:?}", identity.did, identity.key_id);
//! # Ok(())
//! # }
//! ```
pub mod catalog;
pub mod config;
pub mod did;
pub mod document;
pub mod error;
pub mod key;
pub mod kms;
pub mod method;
pub mod provisioner;
pub mod registrar;
pub mod resolution;
pub mod suite;

pub use catalog::{CatalogEntry, CatalogPolicy, KeyCatalog};
pub use config::ProvisionerConfig;
pub use did::DomainRewrite;
pub use document::{IdentityRecord, RecordKey};
pub use error::ProvisioningError;
pub use key::{InvalidKeyId, KeyAlgorithm, KeyDescriptor, KeyId, KeyPurpose, PublicKeyEncoding, VerificationType};
pub use kms::{InMemoryKeyManager, KeyManager, KeyManagerError, PrivateKey};
pub use method::{LocalCreateRequest, LocalMethodClient, MethodClientError};
pub use provisioner::{ProvisionedIdentity, Provisioner, ProvisioningRequest, Strategy};
#[cfg(feature = "http")]
pub use registrar::HttpRegistrarClient;
pub use registrar::{
    CreateRequest, CreateResponse, RegisteredKey, RegistrarClient, RegistrarError,
    RegistrarPublicKey, RegistrarRouting, ResponseShape,
};
pub use resolution::{ResolutionError, Resolver, StaticResolver};
pub use suite::{SignatureSuite, SignatureSuiteMap};

pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
