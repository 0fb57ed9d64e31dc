//! Best-effort outcome notifications

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::bridge::NotificationChannel;
use crate::request::Action;

pub struct Notifier {
    channel: Arc<dyn NotificationChannel>,
    timeout: Duration,
}

impl Notifier {
    pub fn new(channel: Arc<dyn NotificationChannel>, timeout: Duration) -> Self {
        Self { channel, timeout }
    }

    pub async fn notify_success(&self, action: Action, instance_ids: &[String]) {
        let (subject, message) = success_summary(action, instance_ids);
        self.send(&subject, &message).await;
    }

    pub async fn notify_failure(&self, action: Action, error_message: &str) {
        let (subject, message) = failure_summary(action, error_message);
        self.send(&subject, &message).await;
    }

    /// Delivery failures are logged and swallowed
    async fn send(&self, subject: &str, message: &str) {
        match tokio::time::timeout(self.timeout, self.channel.publish(subject, message)).await {
            Ok(Ok(())) => debug!(subject, "Notification sent"),
            Ok(Err(e)) => warn!(subject, error = %e, "Failed to send notification"),
            Err(_) => warn!(
                subject,
                timeout_ms = self.timeout.as_millis() as u64,
                "Notification timed out"
            ),
        }
    }
}

pub fn success_summary(action: Action, instance_ids: &[String]) -> (String, String) {
    (
        format!(
            "Compute Toggle: {} Executed",
            action.as_str().to_uppercase()
        ),
        format!(
            "Successfully {} {} instance(s).\nIDs: {}",
            action.past_tense(),
            instance_ids.len(),
            instance_ids.join(", ")
        ),
    )
}

pub fn failure_summary(action: Action, error_message: &str) -> (String, String) {
    (
        format!("Compute Toggle: FAILED to {}", action),
        format!("Error: {}", error_message),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::NotifyError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct BrokenChannel {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl NotificationChannel for BrokenChannel {
        async fn publish(&self, _subject: &str, _message: &str) -> Result<(), NotifyError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(NotifyError::Transport("connection refused".to_string()))
        }
    }

    struct HangingChannel;

    #[async_trait]
    impl NotificationChannel for HangingChannel {
        async fn publish(&self, _subject: &str, _message: &str) -> Result<(), NotifyError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[test]
    fn test_success_summary() {
        let ids = vec!["i-1".to_string(), "i-2".to_string()];
        let (subject, message) = success_summary(Action::Start, &ids);
        assert_eq!(subject, "Compute Toggle: START Executed");
        assert_eq!(message, "Successfully started 2 instance(s).\nIDs: i-1, i-2");
    }

    #[test]
    fn test_failure_summary() {
        let (subject, message) = failure_summary(Action::Stop, "throttled");
        assert_eq!(subject, "Compute Toggle: FAILED to stop");
        assert_eq!(message, "Error: throttled");
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let channel = Arc::new(BrokenChannel {
            attempts: AtomicUsize::new(0),
        });
        let notifier = Notifier::new(channel.clone(), Duration::from_secs(1));

        notifier.notify_failure(Action::Stop, "throttled").await;
        assert_eq!(channel.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hanging_channel_is_bounded() {
        let notifier = Notifier::new(Arc::new(HangingChannel), Duration::from_millis(50));
        notifier
            .notify_success(Action::Start, &["i-1".to_string()])
            .await;
    }
}
