use crate::domain::push::FailureCode;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Ready,
    Success,
    Fail,
}

impl DeliveryStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Ready)
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready => write!(f, "READY"),
            Self::Success => write!(f, "SUCCESS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "READY" => Ok(Self::Ready),
            "SUCCESS" => Ok(Self::Success),
            "FAIL" => Ok(Self::Fail),
            _ => Err(format!("Invalid delivery status: {s}")),
        }
    }
}

/// Outcome of one dispatch unit (one device token, one message).
///
/// Created `Ready` before the first send and moved to `Success` or `Fail` exactly once.
/// Retries of the same unit reuse this row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeLog {
    pub id: i64,
    pub token_id: i64,
    /// Serialized snapshot of the message that was sent.
    pub payload: String,
    pub failure_code: Option<FailureCode>,
    pub status: DeliveryStatus,
    pub count: i32,
}

impl OutcomeLog {
    pub const INITIAL_COUNT: i32 = 1;

    #[must_use]
    pub const fn ready(id: i64, token_id: i64, payload: String) -> Self {
        Self { id, token_id, payload, failure_code: None, status: DeliveryStatus::Ready, count: Self::INITIAL_COUNT }
    }

    /// # Errors
    /// Returns `AppError::Conflict` if the log has already reached a terminal state.
    pub fn mark_success(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.status = DeliveryStatus::Success;
        Ok(())
    }

    /// Records a terminal failure and bumps the failure counter.
    ///
    /// # Errors
    /// Returns `AppError::Conflict` if the log has already reached a terminal state.
    pub fn mark_fail(&mut self, code: FailureCode) -> Result<()> {
        self.ensure_ready()?;
        self.status = DeliveryStatus::Fail;
        self.failure_code = Some(code);
        self.count += 1;
        Ok(())
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(AppError::Conflict(format!("outcome log {} is already {}", self.id, self.status)));
        }
        Ok(())
    }
}
