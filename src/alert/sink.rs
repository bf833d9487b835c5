//! Webhook alert sink.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur when delivering an alert.
#[derive(Debug, Error)]
pub enum SinkError {
    /// HTTP request failed (connect, timeout, body)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Webhook answered with a non-success status
    #[error("webhook returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Destination for formatted alert text.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Deliver one message.
    async fn send(&self, message: &str) -> Result<(), SinkError>;
}

/// Slack-compatible incoming webhook: `POST {"text": "..."}`.
pub struct WebhookSink {
    url: String,
    client: reqwest::Client,
}

impl WebhookSink {
    /// Create a sink whose requests give up after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

#[async_trait]
impl AlertSink for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, message: &str) -> Result<(), SinkError> {
        debug!(sink = "webhook", "Posting alert");

        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { text: message })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(sink = "webhook", status = %status, "Alert accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(sink = "webhook", status = %status, body = %body, "Webhook request failed");
        Err(SinkError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let json = serde_json::to_value(WebhookPayload { text: "hello" }).unwrap();
        assert_eq!(json, serde_json::json!({ "text": "hello" }));
    }

    #[tokio::test]
    async fn test_unreachable_webhook_is_http_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let sink = WebhookSink::new("http://127.0.0.1:9/hook", Duration::from_millis(500)).unwrap();
        let err = sink.send("x").await.unwrap_err();
        assert!(matches!(err, SinkError::Http(_)));
    }
}
