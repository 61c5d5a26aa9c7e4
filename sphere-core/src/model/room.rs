use crate::model::chat::ChatMessage;
use crate::model::participant::Participant;
use crate::model::peer::PeerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomPrivacy {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub user_id: PeerId,
    pub username: String,
    pub requested_at: DateTime<Utc>,
}

/// Shared study timer. Defaults to a stopped 25 minute session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub duration_secs: u32,
    pub remaining_secs: u32,
    pub running: bool,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            duration_secs: 25 * 60,
            remaining_secs: 25 * 60,
            running: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub privacy: RoomPrivacy,
    pub locked: bool,
    pub notes: String,
    pub timer: TimerState,
    pub participants: Vec<Participant>,
    /// Only populated for admins.
    #[serde(default)]
    pub join_requests: Vec<JoinRequest>,
    #[serde(default)]
    pub chat: Vec<ChatMessage>,
}
