use crate::domain::device_token::{DeviceToken, TokenStatus};
use std::str::FromStr;

#[derive(Debug, sqlx::FromRow)]
pub struct DeviceTokenRecord {
    pub(crate) id: i64,
    pub(crate) user_id: i64,
    pub(crate) device_id: Option<String>,
    pub(crate) token: String,
    pub(crate) status: String,
}

impl From<DeviceTokenRecord> for DeviceToken {
    fn from(record: DeviceTokenRecord) -> Self {
        let status = TokenStatus::from_str(&record.status).unwrap_or_else(|e| {
            tracing::warn!(token_id = record.id, error = %e, "Unknown token status, treating as blocked");
            TokenStatus::Blocked
        });
        Self { id: record.id, user_id: record.user_id, device_id: record.device_id, token: record.token, status }
    }
}
