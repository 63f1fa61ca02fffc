use crate::adapters::database::records::DeviceTokenRecord;
use crate::domain::device_token::{DeviceToken, TokenStatus};
use crate::error::{AppError, Result};
use sqlx::PgConnection;

#[derive(Clone, Debug, Default)]
pub struct DeviceTokenRepository {}

impl DeviceTokenRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Finds the deliverable tokens registered for a user, oldest first.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub(crate) async fn find_active_for_user(&self, conn: &mut PgConnection, user_id: i64) -> Result<Vec<DeviceToken>> {
        let records = sqlx::query_as::<_, DeviceTokenRecord>(
            "SELECT id, user_id, device_id, token, status FROM device_tokens WHERE user_id = $1 AND status = $2 ORDER BY id",
        )
        .bind(user_id)
        .bind(TokenStatus::Active.to_string())
        .fetch_all(conn)
        .await?;

        Ok(records.into_iter().map(Into::into).collect())
    }

    /// Marks a token `INVALID` whatever its current status.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if no such token exists, or `AppError::Database` if the
    /// update fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub(crate) async fn invalidate(&self, conn: &mut PgConnection, token_id: i64) -> Result<()> {
        let result = sqlx::query("UPDATE device_tokens SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(token_id)
            .bind(TokenStatus::Invalid.to_string())
            .execute(conn)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
