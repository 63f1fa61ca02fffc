#![allow(dead_code)]

use async_trait::async_trait;
use push_dispatcher::adapters::memory::MemoryStore;
use push_dispatcher::config::DispatchConfig;
use push_dispatcher::domain::push::{FailureCode, PushMessage};
use push_dispatcher::services::notification::{
    DeliveryExecutor, DeviceRegistry, Dispatcher, OutcomeLogStore, PushError, PushProvider, RetryPolicy,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("push_dispatcher=debug".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().init();
    });
}

/// Fast schedule: 4 attempts, 1ms, 2ms, 4ms between them.
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy::new(4, Duration::from_millis(1), 2.0, Duration::from_millis(10))
}

/// Provider whose responses are scripted per device token.
///
/// Once a token's script runs out every further send succeeds.
#[derive(Debug, Default)]
pub struct ScriptedPushProvider {
    scripts: Mutex<HashMap<String, VecDeque<Result<String, PushError>>>>,
    always_fail: Mutex<HashMap<String, FailureCode>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedPushProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues failures for the next sends to `token`.
    pub fn fail_with(&self, token: &str, codes: &[FailureCode]) {
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts.entry(token.to_string()).or_default();
        script.extend(codes.iter().cloned().map(|code| Err(PushError::from(code))));
    }

    /// Makes every send to `token` fail with `code`.
    pub fn always_fail(&self, token: &str, code: FailureCode) {
        self.always_fail.lock().unwrap().insert(token.to_string(), code);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, token: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|t| *t == token).count()
    }
}

#[async_trait]
impl PushProvider for ScriptedPushProvider {
    async fn send(&self, message: &PushMessage) -> Result<String, PushError> {
        self.calls.lock().unwrap().push(message.token.clone());

        if let Some(code) = self.always_fail.lock().unwrap().get(&message.token) {
            return Err(PushError::from(code.clone()));
        }

        let next = self.scripts.lock().unwrap().get_mut(&message.token).and_then(VecDeque::pop_front);
        next.unwrap_or_else(|| Ok(format!("projects/test/messages/{}", message.token)))
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub provider: Arc<ScriptedPushProvider>,
    pub executor: DeliveryExecutor,
    pub dispatcher: Dispatcher,
}

pub fn harness(policy: RetryPolicy) -> Harness {
    harness_with(policy, &DispatchConfig::default())
}

pub fn harness_with(policy: RetryPolicy, config: &DispatchConfig) -> Harness {
    setup_tracing();
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(ScriptedPushProvider::new());

    let logs = Arc::clone(&store) as Arc<dyn OutcomeLogStore>;
    let registry = Arc::clone(&store) as Arc<dyn DeviceRegistry>;
    let executor = DeliveryExecutor::new(Arc::clone(&provider) as Arc<dyn PushProvider>, Arc::clone(&logs), policy);
    let dispatcher = Dispatcher::new(registry, logs, executor.clone(), config);

    Harness { store, provider, executor, dispatcher }
}
