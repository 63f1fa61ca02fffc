use serde::{Deserialize, Serialize};

/// Deliverability of a device registration.
///
/// Only `Active` tokens receive pushes. Once a token leaves `Active` nothing in this
/// crate moves it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenStatus {
    Active,
    Invalid,
    Blocked,
}

impl TokenStatus {
    #[must_use]
    pub const fn is_deliverable(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Invalid => write!(f, "INVALID"),
            Self::Blocked => write!(f, "BLOCKED"),
        }
    }
}

impl std::str::FromStr for TokenStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "INVALID" => Ok(Self::Invalid),
            "BLOCKED" => Ok(Self::Blocked),
            _ => Err(format!("Invalid token status: {s}")),
        }
    }
}

/// One device registration for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceToken {
    pub id: i64,
    pub user_id: i64,
    pub device_id: Option<String>,
    /// Opaque registration token issued by the push provider.
    pub token: String,
    pub status: TokenStatus,
}

impl DeviceToken {
    #[must_use]
    pub fn is_deliverable(&self) -> bool {
        self.status.is_deliverable()
    }
}
