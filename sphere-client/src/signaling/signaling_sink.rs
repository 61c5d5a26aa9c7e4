use async_trait::async_trait;
use sphere_core::ClientEvent;

use crate::error::SignalingError;

/// Outbound half of the room signaling channel. Sends are fire-and-forget:
/// `Ok` means the event was queued, not that the relay received it.
#[async_trait]
pub trait SignalingSink: Send + Sync {
    async fn emit(&self, event: ClientEvent) -> Result<(), SignalingError>;
}
