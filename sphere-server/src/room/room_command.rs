use sphere_core::{ClientEvent, MediaState, PeerId, RoomPrivacy, UserProfile};

/// Команды, поступающие в комнату от сигнального сервера (WebSocket).
#[derive(Debug)]
pub enum RoomCommand {
    /// Запрос на вход: пользователь прислал `join-room`.
    Join {
        user: UserProfile,
        privacy: RoomPrivacy,
        token: Option<String>,
        media: MediaState,
    },

    /// Любое другое событие участника комнаты.
    Event { peer_id: PeerId, event: ClientEvent },

    /// Сигнал о разрыве WebSocket соединения.
    Disconnect { peer_id: PeerId },
}

impl RoomCommand {
    pub fn is_join(&self) -> bool {
        matches!(self, Self::Join { .. })
    }
}
