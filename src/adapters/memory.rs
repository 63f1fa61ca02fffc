use crate::domain::device_token::{DeviceToken, TokenStatus};
use crate::domain::outcome_log::OutcomeLog;
use crate::error::{AppError, Result};
use crate::services::notification::store::{DeviceRegistry, OutcomeLogStore};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// In-process device registry and outcome log.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tokens: DashMap<i64, DeviceToken>,
    logs: DashMap<i64, OutcomeLog>,
    next_token_id: AtomicI64,
    next_log_id: AtomicI64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a device token for a user and returns it.
    pub fn register(&self, user_id: i64, token: impl Into<String>, status: TokenStatus) -> DeviceToken {
        let id = self.next_token_id.fetch_add(1, Ordering::Relaxed) + 1;
        let device_token = DeviceToken { id, user_id, device_id: None, token: token.into(), status };
        self.tokens.insert(id, device_token.clone());
        device_token
    }

    #[must_use]
    pub fn token(&self, token_id: i64) -> Option<DeviceToken> {
        self.tokens.get(&token_id).map(|t| t.clone())
    }

    #[must_use]
    pub fn log(&self, log_id: i64) -> Option<OutcomeLog> {
        self.logs.get(&log_id).map(|l| l.clone())
    }

    /// All outcome logs, in creation order.
    #[must_use]
    pub fn logs(&self) -> Vec<OutcomeLog> {
        let mut logs: Vec<_> = self.logs.iter().map(|l| l.clone()).collect();
        logs.sort_by_key(|l| l.id);
        logs
    }

    #[must_use]
    pub fn logs_for_token(&self, token_id: i64) -> Vec<OutcomeLog> {
        self.logs().into_iter().filter(|l| l.token_id == token_id).collect()
    }

    fn mark_invalid(&self, token_id: i64) -> Result<()> {
        let mut token = self.tokens.get_mut(&token_id).ok_or(AppError::NotFound)?;
        token.status = TokenStatus::Invalid;
        Ok(())
    }
}

#[async_trait]
impl DeviceRegistry for MemoryStore {
    async fn find_active_tokens(&self, user_id: i64) -> Result<Vec<DeviceToken>> {
        let mut tokens: Vec<_> = self
            .tokens
            .iter()
            .filter(|t| t.user_id == user_id && t.is_deliverable())
            .map(|t| t.clone())
            .collect();
        tokens.sort_by_key(|t| t.id);
        Ok(tokens)
    }

    async fn invalidate(&self, token_id: i64) -> Result<()> {
        self.mark_invalid(token_id)
    }
}

#[async_trait]
impl OutcomeLogStore for MemoryStore {
    async fn create_ready(&self, token_id: i64, payload: &str) -> Result<OutcomeLog> {
        let id = self.next_log_id.fetch_add(1, Ordering::Relaxed) + 1;
        let log = OutcomeLog::ready(id, token_id, payload.to_string());
        self.logs.insert(id, log.clone());
        Ok(log)
    }

    async fn finalize(&self, log: &OutcomeLog, invalidate: Option<i64>) -> Result<()> {
        // Holding the row guard keeps the log update and invalidation together.
        let mut stored = self.logs.get_mut(&log.id).ok_or(AppError::NotFound)?;
        if stored.status.is_terminal() {
            return Err(AppError::Conflict(format!("outcome log {} is not pending", log.id)));
        }

        if let Some(token_id) = invalidate {
            self.mark_invalid(token_id)?;
        }
        *stored = log.clone();
        Ok(())
    }
}
