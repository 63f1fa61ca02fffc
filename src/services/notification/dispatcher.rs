use crate::config::DispatchConfig;
use crate::domain::device_token::DeviceToken;
use crate::domain::notification::NotificationCommand;
use crate::domain::outcome_log::OutcomeLog;
use crate::domain::push::PushMessage;
use crate::services::notification::executor::DeliveryExecutor;
use crate::services::notification::store::{DeviceRegistry, OutcomeLogStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

/// Fans a notification command out into one delivery per active device token.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    registry: Arc<dyn DeviceRegistry>,
    logs: Arc<dyn OutcomeLogStore>,
    executor: DeliveryExecutor,
    semaphore: Arc<Semaphore>,
    timeout: Option<Duration>,
    shutdown: CancellationToken,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<dyn DeviceRegistry>,
        logs: Arc<dyn OutcomeLogStore>,
        executor: DeliveryExecutor,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            registry,
            logs,
            executor,
            semaphore: Arc::new(Semaphore::new(config.concurrency.max(1))),
            timeout: config.timeout(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Ties pending retry waits to an external shutdown signal.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Dispatches `command` to every active device of every recipient and waits until each
    /// delivery has reached a terminal state.
    ///
    /// Recipients without active tokens are skipped. A failing delivery never affects the
    /// others; outcomes are observable only through the outcome logs.
    pub async fn send(&self, command: NotificationCommand) {
        let dispatch_id = Uuid::new_v4();
        let span = tracing::info_span!("dispatch", %dispatch_id, sender = command.sender.id, kind = ?command.kind);
        self.dispatch(command).instrument(span).await;
    }

    async fn dispatch(&self, command: NotificationCommand) {
        let cancel = self.shutdown.child_token();
        let deadline = self.timeout.map(|timeout| {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                tracing::warn!(?timeout, "Dispatch deadline reached, abandoning pending retries");
                cancel.cancel();
            })
        });

        let template = command.kind.template();
        let mut units = JoinSet::new();

        for recipient in &command.recipients {
            let tokens = match self.registry.find_active_tokens(recipient.id).await {
                Ok(tokens) => tokens,
                Err(e) => {
                    tracing::error!(error = %e, recipient = recipient.id, "Failed to look up device tokens, skipping recipient");
                    continue;
                }
            };

            if tokens.is_empty() {
                tracing::debug!(recipient = recipient.id, "Recipient has no active devices");
                continue;
            }

            for token in tokens.into_iter().filter(DeviceToken::is_deliverable) {
                let message = PushMessage::new(token.token.clone(), template.title, template.body);
                let Some(log) = self.prepare(&token, &message).await else {
                    continue;
                };

                let Ok(permit) = Arc::clone(&self.semaphore).acquire_owned().await else {
                    tracing::error!("Dispatch semaphore closed");
                    break;
                };

                let executor = self.executor.clone();
                let cancel = cancel.clone();
                let span = tracing::debug_span!("dispatch_unit", recipient = recipient.id, token_id = token.id);
                units.spawn(
                    async move {
                        let _permit = permit;
                        executor.deliver(&token, &message, log, &cancel).await;
                    }
                    .instrument(span),
                );
            }
        }

        let total = units.len();
        while let Some(joined) = units.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Delivery task aborted");
            }
        }

        if let Some(deadline) = deadline {
            deadline.abort();
        }
        tracing::info!(units = total, "Dispatch finished");
    }

    /// Persists the `READY` log for a unit. A unit without a log is never sent.
    async fn prepare(&self, token: &DeviceToken, message: &PushMessage) -> Option<OutcomeLog> {
        let payload = match serde_json::to_string(message) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, token_id = token.id, "Failed to serialize push message");
                return None;
            }
        };

        match self.logs.create_ready(token.id, &payload).await {
            Ok(log) => Some(log),
            Err(e) => {
                tracing::error!(error = %e, token_id = token.id, "Failed to create outcome log, skipping device");
                None
            }
        }
    }
}
