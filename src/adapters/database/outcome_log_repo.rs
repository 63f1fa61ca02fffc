use crate::adapters::database::records::OutcomeLogRecord;
use crate::domain::outcome_log::{DeliveryStatus, OutcomeLog};
use crate::error::{AppError, Result};
use sqlx::PgConnection;

#[derive(Clone, Debug, Default)]
pub struct OutcomeLogRepository {}

impl OutcomeLogRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Inserts a `READY` log for a token.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the insert fails.
    #[tracing::instrument(level = "debug", skip(self, conn, payload), err)]
    pub(crate) async fn create_ready(&self, conn: &mut PgConnection, token_id: i64, payload: &str) -> Result<OutcomeLog> {
        let record = sqlx::query_as::<_, OutcomeLogRecord>(
            r#"
            INSERT INTO outcome_logs (token_id, payload, status, count)
            VALUES ($1, $2, $3, $4)
            RETURNING id, token_id, payload, failure_code, status, count
            "#,
        )
        .bind(token_id)
        .bind(payload)
        .bind(DeliveryStatus::Ready.to_string())
        .bind(OutcomeLog::INITIAL_COUNT)
        .fetch_one(conn)
        .await?;

        OutcomeLog::try_from(record)
    }

    /// Writes the terminal state of a log that is still `READY` in the database.
    ///
    /// # Errors
    /// Returns `AppError::Conflict` if the row was already finalized or does not exist, or
    /// `AppError::Database` if the update fails.
    #[tracing::instrument(level = "debug", skip(self, conn, log), fields(log_id = log.id, status = %log.status), err)]
    pub(crate) async fn finalize(&self, conn: &mut PgConnection, log: &OutcomeLog) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE outcome_logs
            SET status = $2, failure_code = $3, count = $4, updated_at = NOW()
            WHERE id = $1 AND status = $5
            "#,
        )
        .bind(log.id)
        .bind(log.status.to_string())
        .bind(log.failure_code.as_ref().map(ToString::to_string))
        .bind(log.count)
        .bind(DeliveryStatus::Ready.to_string())
        .execute(conn)
        .await
        .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!("outcome log {} is not pending", log.id)));
        }
        Ok(())
    }

    /// Finds the logs recorded for a token, oldest first.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub async fn find_for_token(&self, conn: &mut PgConnection, token_id: i64) -> Result<Vec<OutcomeLog>> {
        let records = sqlx::query_as::<_, OutcomeLogRecord>(
            "SELECT id, token_id, payload, failure_code, status, count FROM outcome_logs WHERE token_id = $1 ORDER BY id",
        )
        .bind(token_id)
        .fetch_all(conn)
        .await?;

        records.into_iter().map(OutcomeLog::try_from).collect()
    }
}
