use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::blocks::WebhookMessage;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("webhook returned status {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },
}

/// Posts a Block Kit message to a response callback URL. Fire-and-forget at
/// the call sites: failures are logged by callers, never retried, and no
/// delivery confirmation is tracked.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn post(&self, response_url: &str, message: &WebhookMessage) -> Result<(), NotifyError>;
}

pub struct WebhookNotifier {
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn post(&self, response_url: &str, message: &WebhookMessage) -> Result<(), NotifyError> {
        let response = self.client.post(response_url).json(message).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status { status, body });
        }

        debug!(blocks = message.blocks.len(), "webhook message delivered");
        Ok(())
    }
}
