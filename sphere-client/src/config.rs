use serde::Deserialize;
use sphere_core::utils::default_ice_servers;
use sphere_core::{IceServerConfig, RoomId, RoomPrivacy, UserProfile};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub room_id: RoomId,
    pub user: UserProfile,
    #[serde(default)]
    pub privacy: RoomPrivacy,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_ice_servers")]
    pub ice_servers: Vec<IceServerConfig>,
    #[serde(default)]
    pub start_muted: bool,
    #[serde(default)]
    pub start_camera_off: bool,
    #[serde(default = "default_ice_restart_delay_ms")]
    pub ice_restart_delay_ms: u64,
    /// `None` retries a failed connection forever.
    #[serde(default)]
    pub max_ice_restarts: Option<u32>,
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
    #[serde(default = "default_transport_buffer")]
    pub transport_buffer: usize,
}

fn default_ice_restart_delay_ms() -> u64 {
    2000
}

fn default_command_buffer() -> usize {
    64
}

fn default_transport_buffer() -> usize {
    256
}

impl EngineConfig {
    pub fn new(room_id: impl Into<RoomId>, user: UserProfile) -> Self {
        Self {
            room_id: room_id.into(),
            user,
            privacy: RoomPrivacy::Public,
            auth_token: None,
            ice_servers: default_ice_servers(),
            start_muted: false,
            start_camera_off: false,
            ice_restart_delay_ms: default_ice_restart_delay_ms(),
            max_ice_restarts: None,
            command_buffer: default_command_buffer(),
            transport_buffer: default_transport_buffer(),
        }
    }

    pub fn ice_restart_delay(&self) -> Duration {
        Duration::from_millis(self.ice_restart_delay_ms)
    }
}
