use crate::domain::device_token::DeviceToken;
use crate::domain::outcome_log::OutcomeLog;
use crate::error::Result;
use async_trait::async_trait;

/// Lookup and invalidation of device registrations.
#[async_trait]
pub trait DeviceRegistry: Send + Sync + std::fmt::Debug {
    /// Returns the deliverable tokens registered for a user, possibly none.
    ///
    /// # Errors
    /// Returns an error if the lookup fails.
    async fn find_active_tokens(&self, user_id: i64) -> Result<Vec<DeviceToken>>;

    /// Marks a token `INVALID`. Invalidating an already invalid token is not an error.
    ///
    /// Delivery does not call this directly: it invalidates through
    /// [`OutcomeLogStore::finalize`], which implementations back with the same update so the
    /// token change commits together with the outcome.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    async fn invalidate(&self, token_id: i64) -> Result<()>;
}

/// Durable per-unit delivery outcomes.
#[async_trait]
pub trait OutcomeLogStore: Send + Sync + std::fmt::Debug {
    /// Persists a `READY` log for a unit. Must be visible to readers once this returns.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    async fn create_ready(&self, token_id: i64, payload: &str) -> Result<OutcomeLog>;

    /// Writes the terminal state of `log` and, when `invalidate` is set, marks that token
    /// `INVALID` in the same atomic step, with the semantics of [`DeviceRegistry::invalidate`].
    ///
    /// # Errors
    /// Returns `AppError::Conflict` if the stored row is no longer `READY`, or a storage
    /// error. On error nothing is applied.
    async fn finalize(&self, log: &OutcomeLog, invalidate: Option<i64>) -> Result<()>;
}
