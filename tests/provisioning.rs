use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use did_provisioner::{
    CreateRequest, CreateResponse, IdentityRecord, InMemoryKeyManager, KeyAlgorithm, KeyId,
    KeyManager, LocalCreateRequest, LocalMethodClient, MethodClientError, ProvisionedIdentity,
    Provisioner, ProvisionerConfig, ProvisioningError, ProvisioningRequest, RegisteredKey,
    RegistrarClient, RegistrarError, RegistrarRouting, ResolutionError, Resolver, SignatureSuite,
    StaticResolver,
};
use pretty_assertions::assert_eq;

const DRIVER_URL: &str = "https://registrar.example/1.0/register";

type Script = dyn Fn(&CreateRequest) -> Result<CreateResponse, RegistrarError> + Send + Sync;

/// Registrar answering with a scripted response, recording every request.
struct ScriptedRegistrar {
    script: Box<Script>,
    requests: Mutex<Vec<(String, CreateRequest)>>,
}

impl ScriptedRegistrar {
    fn new(
        script: impl Fn(&CreateRequest) -> Result<CreateResponse, RegistrarError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            requests: Mutex::default(),
        })
    }
}

#[async_trait]
impl RegistrarClient for ScriptedRegistrar {
    async fn create_did(
        &self,
        driver_url: &str,
        request: CreateRequest,
    ) -> Result<CreateResponse, RegistrarError> {
        let response = (self.script)(&request);
        self.requests
            .lock()
            .unwrap()
            .push((driver_url.to_owned(), request));
        response
    }
}

/// Method client minting `did:trustbloc:testnet` DIDs.
#[derive(Default)]
struct TestnetMethodClient {
    requests: Mutex<Vec<(String, LocalCreateRequest)>>,
}

#[async_trait]
impl LocalMethodClient for TestnetMethodClient {
    async fn create_did(
        &self,
        domain: &str,
        request: LocalCreateRequest,
    ) -> Result<IdentityRecord, MethodClientError> {
        self.requests
            .lock()
            .unwrap()
            .push((domain.to_owned(), request));
        Ok(IdentityRecord::new("did:trustbloc:testnet:EiBvq4SOWOEM"))
    }
}

struct Harness {
    provisioner: Provisioner,
    kms: Arc<InMemoryKeyManager>,
    method_client: Arc<TestnetMethodClient>,
}

fn harness(registrar: Arc<dyn RegistrarClient>, resolver: Arc<dyn Resolver>) -> Harness {
    let kms = Arc::new(InMemoryKeyManager::new());
    let method_client = Arc::new(TestnetMethodClient::default());
    let provisioner = Provisioner::new(
        ProvisionerConfig::new("example"),
        kms.clone(),
        registrar,
        method_client.clone(),
        resolver,
    );
    Harness {
        provisioner,
        kms,
        method_client,
    }
}

fn no_registrar() -> Arc<ScriptedRegistrar> {
    ScriptedRegistrar::new(|_| Err(RegistrarError::internal("unexpected registrar call")))
}

fn routing() -> RegistrarRouting {
    let mut routing = RegistrarRouting::new(DRIVER_URL);
    routing
        .options
        .insert("ledger".to_owned(), serde_json::json!("test"));
    routing
}

fn ed25519_seed(byte: u8) -> (String, Vec<u8>) {
    let key = ed25519_dalek::SigningKey::from_bytes(&[byte; 32]);
    (
        bs58::encode(key.to_bytes()).into_string(),
        key.verifying_key().to_bytes().to_vec(),
    )
}

#[tokio::test]
async fn local_creation_in_domain() {
    let h = harness(no_registrar(), Arc::new(StaticResolver::new()));

    let identity = h
        .provisioner
        .provision(&ProvisioningRequest::new(
            KeyAlgorithm::Ed25519,
            SignatureSuite::Ed25519Signature2018,
        ))
        .await
        .unwrap();

    let segments: Vec<&str> = identity.did.split(':').collect();
    assert_eq!(segments.len(), 4);
    assert_eq!(segments[2], "example");

    let requests = h.method_client.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (domain, sent) = &requests[0];
    assert_eq!(domain, "example");
    assert_eq!(sent.public_keys.len(), 3);
    assert_eq!(
        identity.key_id.unwrap(),
        format!("{}#{}", identity.did, sent.public_keys[0].id)
    );
    assert_eq!(h.kms.len(), 5);
}

#[tokio::test]
async fn registrar_canonical_response() {
    let registrar = ScriptedRegistrar::new(|request| {
        let identifier = "did:trustbloc:testnet:EiDoVx5bP".to_owned();
        let keys = request
            .public_keys
            .iter()
            .filter_map(|key| key.id.as_ref())
            .map(|id| RegisteredKey::new(format!("{identifier}#{id}")))
            .collect();
        Ok(CreateResponse { identifier, keys })
    });
    let h = harness(registrar.clone(), Arc::new(StaticResolver::new()));

    let identity = h
        .provisioner
        .provision(
            &ProvisioningRequest::new(KeyAlgorithm::P256, SignatureSuite::JsonWebSignature2020)
                .with_registrar(routing()),
        )
        .await
        .unwrap();

    let requests = registrar.requests.lock().unwrap();
    let (driver_url, sent) = &requests[0];
    assert_eq!(driver_url, DRIVER_URL);
    assert_eq!(sent.options["ledger"], "test");
    assert_eq!(sent.public_keys.len(), 5);
    assert!(sent.public_keys[3].recovery);
    assert!(sent.public_keys[4].update);

    let selected = sent.public_keys[2].id.as_deref().unwrap();
    assert_eq!(
        identity,
        ProvisionedIdentity {
            did: "did:trustbloc:example:EiDoVx5bP".to_owned(),
            key_id: Some(format!("did:trustbloc:example:EiDoVx5bP#{selected}")),
        }
    );
}

#[tokio::test]
async fn registrar_canonical_response_without_selected_key() {
    let registrar = ScriptedRegistrar::new(|_| {
        Ok(CreateResponse {
            identifier: "did:trustbloc:testnet:EiDoVx5bP".to_owned(),
            keys: vec![RegisteredKey::new("did:trustbloc:testnet:EiDoVx5bP#k1")],
        })
    });
    let h = harness(registrar, Arc::new(StaticResolver::new()));

    let err = h
        .provisioner
        .provision(
            &ProvisioningRequest::new(KeyAlgorithm::Ed25519, SignatureSuite::Ed25519Signature2018)
                .with_registrar(routing()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisioningError::SelectedKeyNotFound(_)));
    assert!(err.to_string().starts_with("selected key not found"));
}

#[tokio::test]
async fn registrar_alternate_ledger_response() {
    let (private_key, public_key) = ed25519_seed(42);
    let registrar = ScriptedRegistrar::new(move |_| {
        Ok(CreateResponse {
            identifier: "did:v1:test:nym:z6MkpzW2izkFjNwMBwwvKqmELaQcH8t54QL5xmBdJg9Xh1y4".to_owned(),
            keys: vec![
                RegisteredKey {
                    purposes: vec!["capabilityInvocation".to_owned()],
                    private_key_base58: Some("invalid".to_owned()),
                    ..RegisteredKey::new("did:v1:test:nym:z6MkpzW2#z6MkqM1N")
                },
                RegisteredKey {
                    purposes: vec!["authentication".to_owned()],
                    private_key_base58: Some(private_key.clone()),
                    ..RegisteredKey::new("did:v1:test:nym:z6MkpzW2#z6MkrWa5")
                },
            ],
        })
    });
    let h = harness(registrar, Arc::new(StaticResolver::new()));

    let identity = h
        .provisioner
        .provision(
            &ProvisioningRequest::new(KeyAlgorithm::Ed25519, SignatureSuite::Ed25519Signature2018)
                .with_registrar(routing())
                .with_purpose("authentication"),
        )
        .await
        .unwrap();

    // not canonical, left as is
    assert_eq!(
        identity.did,
        "did:v1:test:nym:z6MkpzW2izkFjNwMBwwvKqmELaQcH8t54QL5xmBdJg9Xh1y4"
    );
    assert_eq!(identity.key_id.as_deref(), Some("did:v1:test:nym:z6MkpzW2#z6MkrWa5"));
    assert_eq!(h.kms.export_public_key("z6MkrWa5").await.unwrap(), public_key);
}

#[tokio::test]
async fn registrar_alternate_ledger_response_without_purpose() {
    let registrar = ScriptedRegistrar::new(|_| {
        Ok(CreateResponse {
            identifier: "did:v1:test:nym:z6MkpzW2".to_owned(),
            keys: vec![RegisteredKey {
                purposes: vec!["authentication".to_owned()],
                ..RegisteredKey::new("did:v1:test:nym:z6MkpzW2#z6MkrWa5")
            }],
        })
    });
    let h = harness(registrar, Arc::new(StaticResolver::new()));
    let request = ProvisioningRequest::new(KeyAlgorithm::Ed25519, SignatureSuite::Ed25519Signature2018)
        .with_registrar(routing());

    let err = h
        .provisioner
        .provision(&request.clone().with_purpose("assertionMethod"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisioningError::NoKeyForPurpose(p) if p == "assertionMethod"));

    let err = h
        .provisioner
        .provision(&request.with_purpose("authentication"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisioningError::MissingPrivateKey(id) if id.ends_with("#z6MkrWa5")));
}

#[test_log::test(tokio::test)]
async fn registrar_unrecognized_response() {
    let (private_key, public_key) = ed25519_seed(3);
    let registrar = ScriptedRegistrar::new(move |_| {
        Ok(CreateResponse {
            identifier: "did:sov:WRfXPg8dantKVubE3HX8pw".to_owned(),
            keys: vec![
                RegisteredKey {
                    private_key_base58: Some(private_key.clone()),
                    ..RegisteredKey::new("did:sov:WRfXPg8dantKVubE3HX8pw#key-1")
                },
                RegisteredKey::new("did:sov:WRfXPg8dantKVubE3HX8pw#key-2"),
            ],
        })
    });
    let h = harness(registrar, Arc::new(StaticResolver::new()));

    let identity = h
        .provisioner
        .provision(
            &ProvisioningRequest::new(KeyAlgorithm::P256, SignatureSuite::JsonWebSignature2020)
                .with_registrar(routing()),
        )
        .await
        .unwrap();

    assert_eq!(
        identity.key_id.as_deref(),
        Some("did:sov:WRfXPg8dantKVubE3HX8pw#key-1")
    );
    assert_eq!(h.kms.export_public_key("key-1").await.unwrap(), public_key);
    assert_eq!(h.kms.algorithm("key-1"), Some(KeyAlgorithm::Ed25519));
}

#[tokio::test]
async fn registrar_failure() {
    let registrar = ScriptedRegistrar::new(|_| {
        Err(RegistrarError::NotFinished {
            state: "failed".to_owned(),
            reason: None,
        })
    });
    let h = harness(registrar, Arc::new(StaticResolver::new()));

    let err = h
        .provisioner
        .provision(
            &ProvisioningRequest::new(KeyAlgorithm::Ed25519, SignatureSuite::Ed25519Signature2018)
                .with_registrar(routing()),
        )
        .await
        .unwrap_err();
    assert_eq!(err.collaborator(), Some("registrar"));
    assert!(matches!(
        err,
        ProvisioningError::RegistrarCall { ref driver_url, .. } if driver_url == DRIVER_URL
    ));
    // generated keys are not reclaimed
    assert_eq!(h.kms.len(), 5);
}

#[tokio::test]
async fn existing_did_with_private_key() {
    let (private_key, public_key) = ed25519_seed(11);
    let resolver: StaticResolver = [IdentityRecord::new("did:trustbloc:testnet:EiCZ7p8")]
        .into_iter()
        .collect();
    let h = harness(no_registrar(), Arc::new(resolver));

    let identity = h
        .provisioner
        .provision(
            &ProvisioningRequest::new(KeyAlgorithm::Ed25519, SignatureSuite::Ed25519Signature2018)
                .with_existing_did(
                    "did:trustbloc:testnet:EiCZ7p8",
                    Some("did:trustbloc:testnet:EiCZ7p8#key-7"),
                )
                .with_private_key_base58(private_key),
        )
        .await
        .unwrap();

    assert_eq!(
        identity,
        ProvisionedIdentity {
            did: "did:trustbloc:example:EiCZ7p8".to_owned(),
            key_id: Some("did:trustbloc:example:EiCZ7p8#key-7".to_owned()),
        }
    );
    assert_eq!(h.kms.len(), 1);
    assert_eq!(h.kms.export_public_key("key-7").await.unwrap(), public_key);
}

#[tokio::test]
async fn existing_did_with_bad_private_key() {
    let resolver: StaticResolver = [IdentityRecord::new("did:key:z6Mk")].into_iter().collect();
    let h = harness(no_registrar(), Arc::new(resolver));
    let request = ProvisioningRequest::new(KeyAlgorithm::Ed25519, SignatureSuite::Ed25519Signature2018)
        .with_existing_did("did:key:z6Mk", Some("did:key:z6Mk#z6Mk"));

    // `0` is not in the base58 alphabet
    let err = h
        .provisioner
        .provision(&request.clone().with_private_key_base58("0OIl"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisioningError::PrivateKeyEncoding { .. }));

    let err = h
        .provisioner
        .provision(&request.with_private_key_base58("3yZe7d"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisioningError::InvalidPrivateKey { .. }));
    assert!(h.kms.is_empty());
}

#[tokio::test]
async fn existing_did_p256_request_imports_ed25519_key() {
    let (private_key, public_key) = ed25519_seed(19);
    let resolver: StaticResolver = [IdentityRecord::new("did:key:z6Mk")].into_iter().collect();
    let h = harness(no_registrar(), Arc::new(resolver));

    let identity = h
        .provisioner
        .provision(
            &ProvisioningRequest::new(KeyAlgorithm::P256, SignatureSuite::JsonWebSignature2020)
                .with_existing_did("did:key:z6Mk", Some("did:key:z6Mk#k1"))
                .with_private_key_base58(private_key),
        )
        .await
        .unwrap();

    assert_eq!(identity.key_id.as_deref(), Some("did:key:z6Mk#k1"));
    assert_eq!(h.kms.export_public_key("k1").await.unwrap(), public_key);
}

#[tokio::test]
async fn existing_did_key_id_passes_through() {
    let resolver: StaticResolver = [IdentityRecord::new("did:example:123")].into_iter().collect();
    let h = harness(no_registrar(), Arc::new(resolver));

    let identity = h
        .provisioner
        .provision(
            &ProvisioningRequest::new(KeyAlgorithm::Ed25519, SignatureSuite::Ed25519Signature2018)
                .with_existing_did("did:example:123", Some("did:example:123")),
        )
        .await
        .unwrap();

    assert_eq!(
        identity,
        ProvisionedIdentity {
            did: "did:example:123".to_owned(),
            key_id: Some("did:example:123".to_owned()),
        }
    );
    assert!(h.kms.is_empty());
}

#[test]
fn key_id_without_fragment() {
    assert!("abc".parse::<KeyId>().is_err());
}

/// Resolver failing every resolution.
struct OfflineResolver;

#[async_trait]
impl Resolver for OfflineResolver {
    async fn resolve(&self, _did: &str) -> Result<IdentityRecord, ResolutionError> {
        Err(ResolutionError::internal("connection refused"))
    }
}

#[tokio::test]
async fn resolver_failure() {
    let h = harness(no_registrar(), Arc::new(OfflineResolver));

    let err = h
        .provisioner
        .provision(
            &ProvisioningRequest::new(KeyAlgorithm::Ed25519, SignatureSuite::Ed25519Signature2018)
                .with_existing_did("did:web:example.com", None),
        )
        .await
        .unwrap_err();
    assert_eq!(err.collaborator(), Some("resolver"));
    assert!(err.to_string().contains("did:web:example.com"));
    assert!(h.method_client.requests.lock().unwrap().is_empty());
}
