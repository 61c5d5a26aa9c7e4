use sphere_core::PeerId;
use thiserror::Error;

use crate::session::RoomPhase;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("permission denied for {0}")]
    PermissionDenied(&'static str),

    #[error("no {0} device available")]
    DeviceUnavailable(&'static str),

    #[error("media capture failed: {0}")]
    Capture(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    WebRtc(#[from] webrtc::Error),

    #[error("data channel is not open")]
    DataChannelClosed,

    #[error("transport for {0} is closed")]
    Closed(PeerId),
}

#[derive(Debug, Error)]
pub enum SignalingError {
    #[error(transparent)]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),

    #[error(transparent)]
    Encode(#[from] serde_json::Error),

    #[error("signaling channel closed")]
    Closed,
}

impl From<tokio_tungstenite::tungstenite::Error> for SignalingError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(e))
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Signaling(#[from] SignalingError),

    #[error("stop screen sharing before turning the camera on")]
    ScreenShareActive,

    #[error("local media is still being acquired")]
    MediaNotReady,

    #[error("admin privileges required")]
    NotAdmin,

    #[error("only the room creator can do this")]
    NotCreator,

    #[error("not available while {0:?}")]
    WrongPhase(RoomPhase),

    #[error("unknown participant {0}")]
    UnknownParticipant(PeerId),

    #[error("call engine stopped")]
    EngineStopped,
}
