use crate::domain::push::{FailureCode, PushMessage};
use async_trait::async_trait;
use thiserror::Error;

/// A send rejected by the push provider, carrying the provider's failure code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("push provider rejected message ({code}): {detail}")]
pub struct PushError {
    pub code: FailureCode,
    pub detail: String,
}

impl PushError {
    #[must_use]
    pub fn new(code: FailureCode, detail: impl Into<String>) -> Self {
        Self { code, detail: detail.into() }
    }
}

impl From<FailureCode> for PushError {
    fn from(code: FailureCode) -> Self {
        let detail = code.to_string();
        Self { code, detail }
    }
}

#[async_trait]
pub trait PushProvider: Send + Sync + std::fmt::Debug {
    /// Sends a message to the device token it is addressed to.
    ///
    /// Returns the provider-assigned message id.
    ///
    /// # Errors
    /// Returns `PushError` with the provider's failure code when the send is rejected.
    async fn send(&self, message: &PushMessage) -> Result<String, PushError>;
}
