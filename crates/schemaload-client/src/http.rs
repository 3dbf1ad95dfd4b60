use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use schemaload_core::SchemaDocument;

use crate::client::{Ack, ConfigClient};
use crate::error::LoadError;
use crate::options::ClientOptions;

const FALLBACK_MESSAGE: &str = "Failed to load schema";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// `reqwest`-backed client for `POST /api/config/load`.
#[derive(Debug, Clone)]
pub struct HttpConfigClient {
    client: Client,
    load_url: String,
}

impl HttpConfigClient {
    pub fn new(options: &ClientOptions) -> Result<Self, LoadError> {
        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|err| LoadError::Network(format!("failed to create HTTP client: {err}")))?;

        Ok(Self {
            client,
            load_url: options.load_url(),
        })
    }

    /// Endpoint this client posts to.
    pub fn load_url(&self) -> &str {
        &self.load_url
    }
}

#[async_trait]
impl ConfigClient for HttpConfigClient {
    async fn load(&self, document: SchemaDocument) -> Result<Ack, LoadError> {
        tracing::debug!(event = "config_load_request", url = %self.load_url);

        let response = self
            .client
            .post(&self.load_url)
            .json(&document)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        tracing::debug!(
            event = "config_load_response",
            status = status.as_u16(),
            bytes = body.len()
        );

        if status.is_success() {
            parse_ack(&body)
        } else {
            Err(rejection(status, &body))
        }
    }
}

fn parse_ack(body: &[u8]) -> Result<Ack, LoadError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Ack::default());
    }

    serde_json::from_slice(body)
        .map_err(|err| LoadError::Network(format!("invalid response body: {err}")))
}

fn rejection(status: StatusCode, body: &[u8]) -> LoadError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.error)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("{FALLBACK_MESSAGE} (HTTP {})", status.as_u16()));

    LoadError::Rejected { message }
}
