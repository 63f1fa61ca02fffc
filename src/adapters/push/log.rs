use crate::domain::push::PushMessage;
use crate::services::notification::provider::{PushError, PushProvider};
use async_trait::async_trait;
use uuid::Uuid;

/// Accepts every message and only logs it. Used when no FCM project is configured.
#[derive(Debug, Default)]
pub struct LogPushProvider;

#[async_trait]
impl PushProvider for LogPushProvider {
    async fn send(&self, message: &PushMessage) -> Result<String, PushError> {
        let message_id = format!("dry-run/{}", Uuid::new_v4());
        tracing::info!(token = %message.token, title = %message.notification.title, %message_id, "STUB: push not sent");
        Ok(message_id)
    }
}
