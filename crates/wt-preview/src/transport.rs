use async_trait::async_trait;
use tracing::warn;
use wt_core::{GenerationRequest, PreviewError, Result};
use crate::config::PreviewConfig;

pub const API_KEY_HEADER: &str = "apikey";
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Status code and body text of one HTTP exchange, before any
/// interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The two HTTP calls the protocol makes. Implementations only move bytes;
/// classifying responses is the caller's job.
#[async_trait]
pub trait PreviewTransport: Send + Sync {
    async fn post_generate(&self, request: &GenerationRequest) -> Result<RawResponse>;

    async fn get_status(&self, request_id: &str) -> Result<RawResponse>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    submit_url: String,
    status_url: String,
    api_key: String,
    bearer: String,
}

impl HttpTransport {
    pub fn new(config: &PreviewConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(transport_error)?;

        Ok(Self {
            client,
            submit_url: config.submit_url(),
            status_url: config.status_url(),
            api_key: config.api_key.clone(),
            bearer: config.bearer_token().to_string(),
        })
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = if self.api_key.is_empty() {
            builder
        } else {
            builder.header(API_KEY_HEADER, &self.api_key)
        };

        if self.bearer.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.bearer)
        }
    }

    async fn read(response: reqwest::Response) -> RawResponse {
        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!("could not read response body (HTTP {}): {}", status, e);
                String::new()
            }
        };
        RawResponse { status, body }
    }
}

#[async_trait]
impl PreviewTransport for HttpTransport {
    async fn post_generate(&self, request: &GenerationRequest) -> Result<RawResponse> {
        let response = self
            .authorize(self.client.post(&self.submit_url))
            .header(IDEMPOTENCY_KEY_HEADER, request.idempotency_key().as_str())
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        Ok(Self::read(response).await)
    }

    async fn get_status(&self, request_id: &str) -> Result<RawResponse> {
        let response = self
            .authorize(self.client.get(&self.status_url))
            .query(&[("requestId", request_id)])
            .send()
            .await
            .map_err(transport_error)?;

        Ok(Self::read(response).await)
    }
}

pub fn transport_error(e: reqwest::Error) -> PreviewError {
    let message = if e.is_timeout() {
        format!("request timed out: {}", e)
    } else if e.is_connect() {
        format!("failed to connect to preview service: {}", e)
    } else {
        e.to_string()
    };

    PreviewError::Transport {
        status: e.status().map(|s| s.as_u16()),
        message,
    }
}
