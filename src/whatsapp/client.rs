//! WhatsApp Business API client for outbound text messages.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info};

use super::config::WhatsAppConfig;
use super::error::SendError;

/// Successful outcome of a send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderResponse {
    /// The provider accepted the message; raw response body.
    Delivered(String),
    /// No provider configured; the send was only logged.
    Mock,
}

impl ProviderResponse {
    /// Text stored as the record's `api_response`.
    #[must_use]
    pub fn as_api_response(&self) -> &str {
        match self {
            Self::Delivered(body) => body,
            Self::Mock => "mock",
        }
    }
}

/// Outbound channel used by the inbox. One attempt per call, no retry.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send `text` to `phone`.
    ///
    /// # Errors
    /// Returns an error if the provider is unreachable or rejects the message.
    async fn send(&self, phone: &str, text: &str) -> Result<ProviderResponse, SendError>;
}

#[derive(Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    messaging_product: &'a str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    text: TextBody<'a>,
}

/// `reqwest`-backed sender for the Cloud API.
pub struct WhatsAppClient {
    client: reqwest::Client,
    endpoint: Option<url::Url>,
    token: String,
}

impl WhatsAppClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &WhatsAppConfig) -> Result<Self, SendError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        let endpoint = config
            .base_url
            .as_deref()
            .map(|base| url::Url::parse(&format!("{base}/messages")))
            .transpose()?;

        Ok(Self {
            client,
            endpoint,
            token: config.token.clone(),
        })
    }
}

#[async_trait]
impl MessageSender for WhatsAppClient {
    async fn send(&self, phone: &str, text: &str) -> Result<ProviderResponse, SendError> {
        let Some(endpoint) = &self.endpoint else {
            info!("WhatsApp mock send: to {phone}, message: {text}");
            return Ok(ProviderResponse::Mock);
        };

        let request = SendRequest {
            messaging_product: "whatsapp",
            to: phone,
            kind: "text",
            text: TextBody { body: text },
        };

        let response = self
            .client
            .post(endpoint.clone())
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .inspect_err(|e| error!("WhatsApp request failed: {e}"))?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("WhatsApp API error: {status} {body}");
            return Err(SendError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(ProviderResponse::Delivered(body))
    }
}
