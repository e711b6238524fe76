use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageKind {
    System,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub url: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// A chat message. `id` is only used for de-duplication, ordering is by `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub sender_id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub attachment: Option<Attachment>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub chat: Option<String>,
}

impl Message {
    pub fn is_system(&self) -> bool {
        self.kind == MessageKind::System
    }

    pub fn is_from(&self, user_id: &str) -> bool {
        self.sender_id.as_deref() == Some(user_id)
    }
}
