use async_trait::async_trait;
use sphere_core::{PeerId, ServerEvent};

/// Трейт, который должна реализовать внешняя система (WebSocket сервер),
/// чтобы комната могла доставлять события участникам.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Отправить событие конкретному пользователю.
    /// Если пользователь уже отключился, событие теряется.
    async fn send(&self, peer_id: &PeerId, event: ServerEvent);
}
