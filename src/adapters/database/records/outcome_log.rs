use crate::domain::outcome_log::{DeliveryStatus, OutcomeLog};
use crate::domain::push::FailureCode;
use crate::error::AppError;
use std::str::FromStr;

#[derive(Debug, sqlx::FromRow)]
pub struct OutcomeLogRecord {
    pub(crate) id: i64,
    pub(crate) token_id: i64,
    pub(crate) payload: String,
    pub(crate) failure_code: Option<String>,
    pub(crate) status: String,
    pub(crate) count: i32,
}

impl TryFrom<OutcomeLogRecord> for OutcomeLog {
    type Error = AppError;

    fn try_from(record: OutcomeLogRecord) -> Result<Self, Self::Error> {
        let status = DeliveryStatus::from_str(&record.status).map_err(AppError::Internal)?;
        Ok(Self {
            id: record.id,
            token_id: record.token_id,
            payload: record.payload,
            failure_code: record.failure_code.map(FailureCode::from),
            status,
            count: record.count,
        })
    }
}
