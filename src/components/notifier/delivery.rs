use crate::error::{delivery_error, RelayResult};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

/// Boundary trait for delivering one reminder message to one
/// recipient. Failure is per-recipient and must never escape uncaught;
/// the scheduler logs it and retries on a later tick.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn send(&self, recipient: i64, text: &str) -> RelayResult<()>;
}

/// Delivery sink that posts reminder messages to a webhook endpoint
pub struct WebhookSink {
    client: Client,
    endpoint: Url,
}

impl WebhookSink {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl DeliverySink for WebhookSink {
    async fn send(&self, recipient: i64, text: &str) -> RelayResult<()> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&serde_json::json!({
                "recipient_id": recipient,
                "text": text,
            }))
            .send()
            .await
            .map_err(|e| delivery_error(&format!("Failed to post message: {}", e)))?;

        if !response.status().is_success() {
            return Err(delivery_error(&format!(
                "Webhook rejected message: HTTP {}",
                response.status()
            )));
        }

        Ok(())
    }
}
