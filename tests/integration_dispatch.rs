mod common;

use async_trait::async_trait;
use push_dispatcher::adapters::memory::MemoryStore;
use push_dispatcher::config::DispatchConfig;
use push_dispatcher::domain::device_token::TokenStatus;
use push_dispatcher::domain::notification::{NotificationCommand, NotificationType, Recipient, Sender};
use push_dispatcher::domain::outcome_log::DeliveryStatus;
use push_dispatcher::domain::push::{FailureCode, PushMessage};
use push_dispatcher::services::notification::{
    DeliveryExecutor, DeviceRegistry, Dispatcher, OutcomeLogStore, PushError, PushProvider, RetryPolicy,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn command(recipients: &[i64]) -> NotificationCommand {
    NotificationCommand::new(
        Sender { id: 100 },
        recipients.iter().map(|&id| Recipient { id }).collect(),
        NotificationType::ExampleAlarm,
    )
}

#[tokio::test]
async fn test_recipient_without_devices_is_skipped() {
    let h = common::harness(common::fast_policy());
    let device = h.store.register(1, "tok-1", TokenStatus::Active);

    h.dispatcher.send(command(&[1, 2])).await;

    let logs = h.store.logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].token_id, device.id);
    assert_eq!(logs[0].status, DeliveryStatus::Success);
    assert_eq!(h.provider.calls(), vec!["tok-1".to_string()]);
}

#[tokio::test]
async fn test_one_unit_per_active_device() {
    let h = common::harness(common::fast_policy());
    h.store.register(1, "phone", TokenStatus::Active);
    h.store.register(1, "tablet", TokenStatus::Active);
    h.store.register(1, "old-phone", TokenStatus::Invalid);
    h.store.register(1, "blocked", TokenStatus::Blocked);

    h.dispatcher.send(command(&[1])).await;

    let mut calls = h.provider.calls();
    calls.sort();
    assert_eq!(calls, vec!["phone".to_string(), "tablet".to_string()]);
    assert_eq!(h.store.logs().len(), 2);
}

#[tokio::test]
async fn test_duplicate_recipients_are_sent_twice() {
    let h = common::harness(common::fast_policy());
    h.store.register(1, "tok", TokenStatus::Active);

    h.dispatcher.send(command(&[1, 1])).await;

    assert_eq!(h.provider.calls_for("tok"), 2);
    assert_eq!(h.store.logs().len(), 2);
    assert!(h.store.logs().iter().all(|l| l.status == DeliveryStatus::Success));
}

#[tokio::test]
async fn test_payload_snapshot_uses_template() {
    let h = common::harness(common::fast_policy());
    h.store.register(1, "tok", TokenStatus::Active);

    h.dispatcher.send(command(&[1])).await;

    let snapshot: PushMessage = serde_json::from_str(&h.store.logs()[0].payload).unwrap();
    let template = NotificationType::ExampleAlarm.template();
    assert_eq!(snapshot.token, "tok");
    assert_eq!(snapshot.notification.title, template.title);
    assert_eq!(snapshot.notification.body, template.body);
}

#[tokio::test]
async fn test_permanent_failure_is_isolated() {
    let h = common::harness(common::fast_policy());
    let good_a = h.store.register(1, "good-a", TokenStatus::Active);
    let dead = h.store.register(2, "dead", TokenStatus::Active);
    let flaky = h.store.register(3, "flaky", TokenStatus::Active);
    let wrong_env = h.store.register(4, "wrong-env", TokenStatus::Active);
    h.provider.always_fail("dead", FailureCode::Unregistered);
    h.provider.fail_with("flaky", &[FailureCode::Unavailable]);
    h.provider.always_fail("wrong-env", FailureCode::ThirdPartyAuthError);

    h.dispatcher.send(command(&[1, 2, 3, 4])).await;

    let status_of = |token_id| h.store.logs_for_token(token_id)[0].status;
    assert_eq!(status_of(good_a.id), DeliveryStatus::Success);
    assert_eq!(status_of(dead.id), DeliveryStatus::Fail);
    assert_eq!(status_of(flaky.id), DeliveryStatus::Success);
    assert_eq!(status_of(wrong_env.id), DeliveryStatus::Fail);

    assert_eq!(h.store.token(dead.id).unwrap().status, TokenStatus::Invalid);
    assert_eq!(h.store.token(wrong_env.id).unwrap().status, TokenStatus::Active);
    assert_eq!(h.provider.calls_for("flaky"), 2);
}

#[tokio::test]
async fn test_invalidated_token_is_skipped_next_time() {
    let h = common::harness(common::fast_policy());
    h.store.register(1, "dead", TokenStatus::Active);
    h.provider.always_fail("dead", FailureCode::Unregistered);

    h.dispatcher.send(command(&[1])).await;
    h.dispatcher.send(command(&[1])).await;

    assert_eq!(h.provider.calls_for("dead"), 1);
    assert_eq!(h.store.logs().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_abandons_pending_retries() {
    let config = DispatchConfig { timeout_secs: Some(1), ..DispatchConfig::default() };
    let h = common::harness_with(RetryPolicy::default(), &config);
    let device = h.store.register(1, "tok", TokenStatus::Active);
    h.provider.always_fail("tok", FailureCode::Internal);

    let start = tokio::time::Instant::now();
    h.dispatcher.send(command(&[1])).await;

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(h.provider.calls_for("tok"), 1);
    let log = &h.store.logs_for_token(device.id)[0];
    assert_eq!(log.status, DeliveryStatus::Fail);
    assert_eq!(log.failure_code, Some(FailureCode::Internal));
}

#[tokio::test(start_paused = true)]
async fn test_units_back_off_concurrently() {
    let h = common::harness(RetryPolicy::default());
    for user in 1..=3 {
        let token = format!("tok-{user}");
        h.store.register(user, token.clone(), TokenStatus::Active);
        h.provider.fail_with(&token, &[FailureCode::Unavailable]);
    }

    let start = tokio::time::Instant::now();
    h.dispatcher.send(command(&[1, 2, 3])).await;

    assert!(start.elapsed() < Duration::from_secs(10), "backoff waits should overlap");
    assert!(h.store.logs().iter().all(|l| l.status == DeliveryStatus::Success));
}

/// Checks that the unit's outcome row already exists when the provider is called.
#[derive(Debug)]
struct ReadyRowAuditor {
    store: Arc<MemoryStore>,
    ready_seen: AtomicUsize,
}

#[async_trait]
impl PushProvider for ReadyRowAuditor {
    async fn send(&self, message: &PushMessage) -> Result<String, PushError> {
        let pending: Vec<_> = self
            .store
            .logs()
            .into_iter()
            .filter(|l| l.status == DeliveryStatus::Ready && l.payload.contains(&message.token))
            .collect();
        if !pending.is_empty() {
            self.ready_seen.fetch_add(1, Ordering::SeqCst);
        }
        Err(PushError::from(FailureCode::SenderIdMismatch))
    }
}

#[tokio::test]
async fn test_ready_row_exists_before_send() {
    common::setup_tracing();
    let store = Arc::new(MemoryStore::new());
    store.register(1, "tok-a", TokenStatus::Active);
    store.register(2, "tok-b", TokenStatus::Active);
    let auditor = Arc::new(ReadyRowAuditor { store: Arc::clone(&store), ready_seen: AtomicUsize::new(0) });

    let logs = Arc::clone(&store) as Arc<dyn OutcomeLogStore>;
    let executor =
        DeliveryExecutor::new(Arc::clone(&auditor) as Arc<dyn PushProvider>, Arc::clone(&logs), common::fast_policy());
    let dispatcher =
        Dispatcher::new(Arc::clone(&store) as Arc<dyn DeviceRegistry>, logs, executor, &DispatchConfig::default());

    dispatcher.send(command(&[1, 2])).await;

    assert_eq!(auditor.ready_seen.load(Ordering::SeqCst), 2);
    assert!(store.logs().iter().all(|l| l.status == DeliveryStatus::Fail));
}
