use crate::adapters::database::DbPool;
use crate::adapters::database::device_token_repo::DeviceTokenRepository;
use crate::adapters::database::outcome_log_repo::OutcomeLogRepository;
use crate::domain::device_token::DeviceToken;
use crate::domain::outcome_log::OutcomeLog;
use crate::error::Result;
use crate::services::notification::store::{DeviceRegistry, OutcomeLogStore};
use async_trait::async_trait;

/// PostgreSQL-backed device registry and outcome log.
#[derive(Clone, Debug)]
pub struct PgDeliveryStore {
    pool: DbPool,
    tokens: DeviceTokenRepository,
    logs: OutcomeLogRepository,
}

impl PgDeliveryStore {
    #[must_use]
    pub const fn new(pool: DbPool, tokens: DeviceTokenRepository, logs: OutcomeLogRepository) -> Self {
        Self { pool, tokens, logs }
    }

    /// Returns every outcome log recorded for a token.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn logs_for_token(&self, token_id: i64) -> Result<Vec<OutcomeLog>> {
        let mut conn = self.pool.acquire().await?;
        self.logs.find_for_token(&mut conn, token_id).await
    }
}

#[async_trait]
impl DeviceRegistry for PgDeliveryStore {
    async fn find_active_tokens(&self, user_id: i64) -> Result<Vec<DeviceToken>> {
        let mut conn = self.pool.acquire().await?;
        self.tokens.find_active_for_user(&mut conn, user_id).await
    }

    async fn invalidate(&self, token_id: i64) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        self.tokens.invalidate(&mut conn, token_id).await
    }
}

#[async_trait]
impl OutcomeLogStore for PgDeliveryStore {
    async fn create_ready(&self, token_id: i64, payload: &str) -> Result<OutcomeLog> {
        let mut conn = self.pool.acquire().await?;
        self.logs.create_ready(&mut conn, token_id, payload).await
    }

    async fn finalize(&self, log: &OutcomeLog, invalidate: Option<i64>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        self.logs.finalize(&mut tx, log).await?;
        if let Some(token_id) = invalidate {
            self.tokens.invalidate(&mut tx, token_id).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
