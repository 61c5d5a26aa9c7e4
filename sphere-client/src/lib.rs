pub mod config;
pub mod engine;
pub mod error;
pub mod media;
pub mod negotiation;
pub mod participants;
pub mod session;
pub mod signaling;
pub mod transport;

pub use config::EngineConfig;
pub use engine::{CallEngine, CallEvent, CallHandle, Notice, NoticeLevel, PeerView, RoomView};
pub use error::{ClientError, MediaError, SignalingError, TransportError};
pub use session::RoomPhase;
