//! Message Transports
//!
//! Outbound gateway clients. Each transport owns its HTTP client and
//! credentials; the dispatcher only sees the trait.

use async_trait::async_trait;
use serde::Deserialize;
use shared::models::MessageChannel;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Gateway request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Gateway rejected message: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait MessageTransport: Send + Sync {
    fn channel(&self) -> MessageChannel;

    async fn send(&self, phone: &str, content: &str) -> Result<(), TransportError>;

    /// Signal "typing..." to the recipient before sending. Only some
    /// channels support it; the default is a successful no-op so the
    /// dispatcher can call it unconditionally.
    async fn notify_typing(&self, _phone: &str) -> Result<(), TransportError> {
        Ok(())
    }
}

#[derive(Deserialize)]
struct GatewayResponse {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

async fn parse_gateway_response(response: reqwest::Response) -> Result<(), TransportError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TransportError::Rejected(format!("HTTP {status}: {body}")));
    }
    let body: GatewayResponse = response.json().await?;
    if body.success {
        Ok(())
    } else {
        Err(TransportError::Rejected(
            body.error.unwrap_or_else(|| "unknown gateway error".to_string()),
        ))
    }
}

/// SMS over a JSON HTTP gateway (Beem/Africa's Talking style).
pub struct SmsGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    sender_id: String,
}

impl SmsGateway {
    pub fn new(
        endpoint: String,
        api_key: String,
        sender_id: String,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
            sender_id,
        })
    }
}

#[async_trait]
impl MessageTransport for SmsGateway {
    fn channel(&self) -> MessageChannel {
        MessageChannel::Sms
    }

    async fn send(&self, phone: &str, content: &str) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "to": phone,
                "from": self.sender_id,
                "message": content,
            }))
            .send()
            .await?;
        parse_gateway_response(response).await
    }
}

/// WhatsApp over a session-based bridge (whatsapp-web.js style). The
/// bridge exposes a typing endpoint, which we use to make paced sends
/// look human.
pub struct WhatsAppGateway {
    client: reqwest::Client,
    base_url: String,
    session_id: String,
}

impl WhatsAppGateway {
    pub fn new(base_url: String, session_id: String) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url,
            session_id,
        })
    }
}

#[async_trait]
impl MessageTransport for WhatsAppGateway {
    fn channel(&self) -> MessageChannel {
        MessageChannel::Whatsapp
    }

    async fn send(&self, phone: &str, content: &str) -> Result<(), TransportError> {
        let url = format!("{}/api/sessions/{}/messages", self.base_url, self.session_id);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "to": phone,
                "body": content,
            }))
            .send()
            .await?;
        parse_gateway_response(response).await
    }

    async fn notify_typing(&self, phone: &str) -> Result<(), TransportError> {
        let url = format!("{}/api/sessions/{}/typing", self.base_url, self.session_id);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "to": phone }))
            .send()
            .await?;
        parse_gateway_response(response).await
    }
}
