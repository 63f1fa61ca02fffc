use serde::{Deserialize, Serialize};

/// Title and body shown on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub title: &'static str,
    pub body: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    ExampleAlarm,
}

impl NotificationType {
    /// Looks up the template for this notification type.
    #[must_use]
    pub const fn template(self) -> Template {
        match self {
            Self::ExampleAlarm => Template { title: "Example title", body: "Example message" },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: i64,
}

/// One logical notification, consumed once by the dispatcher.
///
/// Recipients keep their order and may repeat; a repeated recipient is sent to twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationCommand {
    pub sender: Sender,
    pub recipients: Vec<Recipient>,
    #[serde(rename = "type")]
    pub kind: NotificationType,
}

impl NotificationCommand {
    #[must_use]
    pub const fn new(sender: Sender, recipients: Vec<Recipient>, kind: NotificationType) -> Self {
        Self { sender, recipients, kind }
    }
}

/// Business payloads that produce notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationPayload {
    ExampleAlarm { sender: Sender, recipients: Vec<Recipient> },
}

impl From<NotificationPayload> for NotificationCommand {
    fn from(payload: NotificationPayload) -> Self {
        match payload {
            NotificationPayload::ExampleAlarm { sender, recipients } => {
                Self::new(sender, recipients, NotificationType::ExampleAlarm)
            }
        }
    }
}
