use serde::{Deserialize, Serialize};

/// Media flags a participant broadcasts to the room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaState {
    #[serde(default)]
    pub is_muted: bool,
    #[serde(default)]
    pub is_camera_off: bool,
    #[serde(default)]
    pub is_screen_sharing: bool,
}

impl MediaState {
    /// Camera video and screen video are never transmitted together.
    pub fn is_consistent(&self) -> bool {
        !self.is_screen_sharing || self.is_camera_off
    }

    pub fn sends_video(&self) -> bool {
        self.is_screen_sharing || !self.is_camera_off
    }
}
