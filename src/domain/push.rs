use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
}

/// A message addressed to a single device token.
///
/// The serialized form is what gets sent to the provider and what is kept in the
/// outcome log for auditing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub token: String,
    pub notification: PushNotification,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

impl PushMessage {
    #[must_use]
    pub fn new(token: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            notification: PushNotification { title: title.into(), body: body.into() },
            data: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Failure code reported by the push provider.
///
/// Codes outside the known set are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum FailureCode {
    Internal,
    Unavailable,
    QuotaExceeded,
    Unregistered,
    InvalidArgument,
    SenderIdMismatch,
    ThirdPartyAuthError,
    UnspecifiedError,
    Other(String),
}

impl FailureCode {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Internal => "INTERNAL",
            Self::Unavailable => "UNAVAILABLE",
            Self::QuotaExceeded => "QUOTA_EXCEEDED",
            Self::Unregistered => "UNREGISTERED",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::SenderIdMismatch => "SENDER_ID_MISMATCH",
            Self::ThirdPartyAuthError => "THIRD_PARTY_AUTH_ERROR",
            Self::UnspecifiedError => "UNSPECIFIED_ERROR",
            Self::Other(code) => code,
        }
    }
}

impl std::fmt::Display for FailureCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for FailureCode {
    fn from(s: &str) -> Self {
        match s {
            "INTERNAL" => Self::Internal,
            "UNAVAILABLE" => Self::Unavailable,
            "QUOTA_EXCEEDED" => Self::QuotaExceeded,
            "UNREGISTERED" => Self::Unregistered,
            "INVALID_ARGUMENT" => Self::InvalidArgument,
            "SENDER_ID_MISMATCH" => Self::SenderIdMismatch,
            "THIRD_PARTY_AUTH_ERROR" => Self::ThirdPartyAuthError,
            "UNSPECIFIED_ERROR" => Self::UnspecifiedError,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for FailureCode {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<FailureCode> for String {
    fn from(code: FailureCode) -> Self {
        match code {
            FailureCode::Other(code) => code,
            known => known.as_str().to_string(),
        }
    }
}
