use crate::room::RoomSettings;
use anyhow::Context;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

/// Relay server settings, read from a TOML file. Every key is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// When set, `join-room` must carry the same token.
    pub access_token: Option<String>,
    pub room_capacity: usize,
    pub chat_history: usize,
    pub command_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let room = RoomSettings::default();
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            access_token: None,
            room_capacity: room.capacity,
            chat_history: room.chat_history,
            command_buffer: 100,
        }
    }
}

impl ServerConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn room_settings(&self) -> RoomSettings {
        RoomSettings {
            capacity: self.room_capacity,
            chat_history: self.chat_history,
            access_token: self.access_token.clone(),
        }
    }
}
