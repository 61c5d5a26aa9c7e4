use crate::model::participant::UserProfile;
use crate::model::peer::PeerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    Text,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub user_id: PeerId,
    pub username: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ChatKind,
    #[serde(default)]
    pub read: bool,
}

impl ChatMessage {
    /// A message typed by `author`. The author has obviously read it.
    pub fn text(author: &UserProfile, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: author.id.clone(),
            username: author.name.clone(),
            message: message.into(),
            timestamp: Utc::now(),
            kind: ChatKind::Text,
            read: true,
        }
    }
}
