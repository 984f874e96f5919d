use std::fmt;

use actix_web::HttpResponse;
use reqwest::header::CONTENT_TYPE;

use crate::error::{RelayError, RelayResult};
use crate::io_struct::{ChatReply, RelayPayload, UpstreamReply};

pub const DEFAULT_ENDPOINT_URL: &str = "https://aiproject-uwohx.eastus.inference.ml.azure.com/score";
pub const DEFAULT_DEPLOYMENT: &str = "aiproject-uwohx-3";
pub const DEPLOYMENT_HEADER: &str = "azureml-model-deployment";
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024; // 16MB

/// Bearer credential for the inference service. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        ApiKey(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub endpoint_url: String,
    pub deployment: String,
    pub api_key: Option<ApiKey>,
    pub max_payload_size: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            deployment: DEFAULT_DEPLOYMENT.to_string(),
            api_key: None,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayState {
    pub client: reqwest::Client,
    pub endpoint_url: String,
    pub deployment: String,
    pub max_payload_size: usize,
    api_key: Option<ApiKey>,
}

impl RelayState {
    pub fn new(config: &RelayConfig) -> anyhow::Result<Self> {
        // No timeout: a call runs until the service answers or the transport fails.
        let client = reqwest::Client::builder().build()?;
        if config.api_key.is_none() {
            log::warn!("No API key configured; every chat request will fail until one is set");
        }
        Ok(Self {
            client,
            endpoint_url: config.endpoint_url.clone(),
            deployment: config.deployment.clone(),
            max_payload_size: config.max_payload_size,
            api_key: config.api_key.clone(),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn require_api_key(&self) -> RelayResult<&ApiKey> {
        self.api_key.as_ref().ok_or(RelayError::ConfigurationError)
    }

    /// Validates one inbound chat body, forwards it and normalizes the answer.
    pub async fn relay(&self, body: &[u8]) -> RelayResult<ChatReply> {
        let api_key = self.require_api_key()?;

        let payload = RelayPayload::from_slice(body)?;
        log::info!("Received question: {}", payload.question);
        log::info!(
            "Received chat history: {}",
            serde_json::to_string(&payload.chat_history)?
        );
        log::info!(
            "Sending request to inference service: {}",
            serde_json::to_string_pretty(&payload)?
        );

        let resp = self
            .client
            .post(&self.endpoint_url)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(api_key.expose())
            .header(DEPLOYMENT_HEADER, &self.deployment)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        if !is_json {
            let text = resp.text().await?;
            log::error!("Inference service error ({status}): {text}");
            // A success status cannot carry an error envelope to the client.
            let status = if status.as_u16() < 400 {
                502
            } else {
                status.as_u16()
            };
            return Err(RelayError::UpstreamError {
                status,
                message: text,
            });
        }

        let bytes = resp.bytes().await?;
        log::info!(
            "Inference service full response ({status}): {}",
            String::from_utf8_lossy(&bytes)
        );
        match UpstreamReply::from_slice(&bytes)? {
            UpstreamReply::Answer(response) => Ok(ChatReply { response }),
            UpstreamReply::Failure(message) => {
                log::error!("Inference service error: {message}");
                Err(RelayError::UpstreamError {
                    status: 500,
                    message,
                })
            }
        }
    }

    pub async fn chat(&self, body: &[u8]) -> Result<HttpResponse, RelayError> {
        let reply = self.relay(body).await?;
        Ok(HttpResponse::Ok().json(reply))
    }
}
