//! Notification channel backends

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use super::http::{read_error, HttpEndpoint};
use super::{NotificationChannel, NotifyError};

/// Writes notifications to the log instead of delivering them
#[derive(Debug, Clone)]
pub struct LogChannel {
    channel: String,
}

impl LogChannel {
    pub fn new(channel: &str) -> Self {
        Self {
            channel: channel.to_string(),
        }
    }
}

#[async_trait]
impl NotificationChannel for LogChannel {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), NotifyError> {
        info!(channel = %self.channel, subject, "{}", message);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    subject: &'a str,
    message: &'a str,
}

/// Posts notifications to `POST /channels/{channel}/messages`
#[derive(Debug, Clone)]
pub struct WebhookChannel {
    endpoint: HttpEndpoint,
    channel: String,
}

impl WebhookChannel {
    pub fn new(base_url: &str, channel: &str, timeout_ms: u64) -> Result<Self, NotifyError> {
        let endpoint = HttpEndpoint::new(base_url, timeout_ms)
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(Self {
            endpoint,
            channel: channel.to_string(),
        })
    }

    fn messages_url(&self) -> String {
        self.endpoint
            .url(&format!("/channels/{}/messages", self.channel))
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), NotifyError> {
        let response = self
            .endpoint
            .client()
            .post(self.messages_url())
            .json(&WebhookMessage { subject, message })
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let (status, detail) = read_error(response).await;
            return Err(NotifyError::Rejected {
                status,
                message: detail.message,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_url() {
        let channel = WebhookChannel::new("http://hooks.local/", "ops-alerts", 1000).unwrap();
        assert_eq!(
            channel.messages_url(),
            "http://hooks.local/channels/ops-alerts/messages"
        );
    }

    #[test]
    fn test_log_channel_always_delivers() {
        let channel = LogChannel::new("ops-alerts");
        let result = tokio_test::block_on(channel.publish("subject", "body"));
        assert!(result.is_ok());
    }
}
