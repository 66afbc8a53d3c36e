//! HTTP binding of the universal registrar `create` operation.
//!
//! <https://identity.foundation/did-registration/#create>
use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CreateRequest, CreateResponse, RegisteredKey, RegistrarClient, RegistrarError, RegistrarPublicKey};

/// Registration state signalling a completed creation.
pub const STATE_FINISHED: &str = "finished";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationRequest<'a> {
    options: &'a HashMap<String, Value>,
    secret: Secret,
    did_document: DocumentTemplate<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentTemplate<'a> {
    public_key: &'a [RegistrarPublicKey],
}

#[derive(Default, Serialize, Deserialize)]
struct Secret {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    keys: Vec<RegisteredKey>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationResponse {
    #[serde(default)]
    job_id: Option<String>,
    did_state: DidState,
}

#[derive(Deserialize)]
struct DidState {
    state: String,

    #[serde(default)]
    identifier: Option<String>,

    #[serde(default)]
    reason: Option<String>,

    #[serde(default)]
    secret: Secret,
}

/// Registrar client speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRegistrarClient {
    client: reqwest::Client,
}

impl HttpRegistrarClient {
    pub fn new() -> Result<Self, RegistrarError> {
        let client = reqwest::Client::builder()
            .user_agent(crate::USER_AGENT)
            .build()
            .map_err(|e| RegistrarError::HttpClient(e.to_string()))?;
        Ok(Self { client })
    }

    /// Uses a preconfigured HTTP client (proxies, TLS roots, timeouts).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RegistrarClient for HttpRegistrarClient {
    async fn create_did(
        &self,
        driver_url: &str,
        request: CreateRequest,
    ) -> Result<CreateResponse, RegistrarError> {
        let body = RegistrationRequest {
            options: &request.options,
            secret: Secret::default(),
            did_document: DocumentTemplate {
                public_key: &request.public_keys,
            },
        };

        let resp = self
            .client
            .post(driver_url)
            .json(&body)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| RegistrarError::HttpRequest(e.to_string()))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| RegistrarError::HttpResponse(e.to_string()))?;

        if !status.is_success() {
            return Err(RegistrarError::HttpServer {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let registration: RegistrationResponse =
            serde_json::from_slice(&bytes).map_err(|e| RegistrarError::Json(e.to_string()))?;

        let state = registration.did_state;
        if state.state != STATE_FINISHED {
            return Err(RegistrarError::NotFinished {
                state: state.state,
                reason: state.reason,
            });
        }

        let identifier = state.identifier.ok_or_else(|| {
            RegistrarError::Json(format!(
                "finished registration without identifier (job {})",
                registration.job_id.as_deref().unwrap_or("-")
            ))
        })?;

        Ok(CreateResponse {
            identifier,
            keys: state.secret.keys,
        })
    }
}
