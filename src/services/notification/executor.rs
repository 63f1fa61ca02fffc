use crate::domain::device_token::DeviceToken;
use crate::domain::outcome_log::OutcomeLog;
use crate::domain::push::{FailureCode, PushMessage};
use crate::services::notification::classifier::{Decision, classify};
use crate::services::notification::provider::PushProvider;
use crate::services::notification::retry::RetryPolicy;
use crate::services::notification::store::OutcomeLogStore;
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Debug)]
struct Metrics {
    sent: Counter<u64>,
    errors: Counter<u64>,
    retries: Counter<u64>,
    invalidated_tokens: Counter<u64>,
    finalize_errors: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("push-dispatcher");
        Self {
            sent: meter
                .u64_counter("push_sent_total")
                .with_description("Total number of push notifications successfully sent")
                .build(),
            errors: meter
                .u64_counter("push_errors_total")
                .with_description("Total number of deliveries that ended in failure")
                .build(),
            retries: meter
                .u64_counter("push_retries_total")
                .with_description("Total number of send retries after a transient failure")
                .build(),
            invalidated_tokens: meter
                .u64_counter("push_invalidated_tokens_total")
                .with_description("Total number of device tokens invalidated after a permanent failure")
                .build(),
            finalize_errors: meter
                .u64_counter("push_outcome_record_errors_total")
                .with_description("Total number of delivery outcomes that could not be persisted")
                .build(),
        }
    }
}

/// Why a delivery ended without success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailReason {
    Exhausted,
    Cancelled,
    Invalidated,
    Stopped,
}

impl FailReason {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Exhausted => "retries_exhausted",
            Self::Cancelled => "cancelled",
            Self::Invalidated => "token_invalidated",
            Self::Stopped => "stopped",
        }
    }
}

/// Sends one message to one device token, retrying transient failures and recording the
/// terminal outcome.
#[derive(Clone, Debug)]
pub struct DeliveryExecutor {
    provider: Arc<dyn PushProvider>,
    logs: Arc<dyn OutcomeLogStore>,
    policy: RetryPolicy,
    metrics: Metrics,
}

impl DeliveryExecutor {
    pub fn new(provider: Arc<dyn PushProvider>, logs: Arc<dyn OutcomeLogStore>, policy: RetryPolicy) -> Self {
        Self { provider, logs, policy, metrics: Metrics::new() }
    }

    /// Delivers `message` to `token` and drives `log` to its terminal state.
    ///
    /// Never fails: provider rejections become log and registry updates, and errors while
    /// persisting the outcome are only reported. Cancelling `cancel` abandons a pending
    /// retry wait and records the last failure.
    #[tracing::instrument(level = "debug", skip_all, fields(token_id = token.id, log_id = log.id))]
    pub async fn deliver(&self, token: &DeviceToken, message: &PushMessage, log: OutcomeLog, cancel: &CancellationToken) {
        let mut delays = self.policy.delays();
        let mut attempt: u32 = 1;

        loop {
            let err = match self.provider.send(message).await {
                Ok(message_id) => {
                    tracing::info!(%message_id, attempt, "Push notification sent");
                    self.metrics.sent.add(1, &[]);
                    self.succeed(log).await;
                    return;
                }
                Err(err) => err,
            };

            match classify(&err.code) {
                Decision::Retry => {
                    let Some(delay) = delays.next() else {
                        tracing::warn!(code = %err.code, attempt, "Retry budget exhausted");
                        self.fail(token, log, err.code, FailReason::Exhausted).await;
                        return;
                    };

                    tracing::warn!(code = %err.code, attempt, ?delay, "Transient push failure, backing off");
                    self.metrics.retries.add(1, &[]);

                    tokio::select! {
                        () = tokio::time::sleep(delay) => {}
                        () = cancel.cancelled() => {
                            tracing::warn!(code = %err.code, attempt, "Retry wait cancelled");
                            self.fail(token, log, err.code, FailReason::Cancelled).await;
                            return;
                        }
                    }
                    attempt += 1;
                }
                Decision::InvalidateToken => {
                    tracing::info!(code = %err.code, "Token rejected by provider, invalidating");
                    self.fail(token, log, err.code, FailReason::Invalidated).await;
                    return;
                }
                Decision::StopOnly => {
                    tracing::error!(code = %err.code, detail = %err.detail, "Push failed, not retrying");
                    self.fail(token, log, err.code, FailReason::Stopped).await;
                    return;
                }
            }
        }
    }

    async fn succeed(&self, mut log: OutcomeLog) {
        if let Err(e) = log.mark_success() {
            tracing::error!(error = %e, "Cannot mark outcome log as sent");
            return;
        }
        self.record(&log, None).await;
    }

    async fn fail(&self, token: &DeviceToken, mut log: OutcomeLog, code: FailureCode, reason: FailReason) {
        self.metrics.errors.add(1, &[KeyValue::new("reason", reason.as_str())]);

        if let Err(e) = log.mark_fail(code) {
            tracing::error!(error = %e, "Cannot mark outcome log as failed");
            return;
        }

        let invalidate = (reason == FailReason::Invalidated).then_some(token.id);
        if self.record(&log, invalidate).await && invalidate.is_some() {
            self.metrics.invalidated_tokens.add(1, &[]);
        }
    }

    async fn record(&self, log: &OutcomeLog, invalidate: Option<i64>) -> bool {
        match self.logs.finalize(log, invalidate).await {
            Ok(()) => {
                tracing::debug!(status = %log.status, count = log.count, "Recorded delivery outcome");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, status = %log.status, "Failed to record delivery outcome");
                self.metrics.finalize_errors.add(1, &[]);
                false
            }
        }
    }
}
