mod chat;
mod media;
mod packet;
mod participant;
mod peer;
mod room;
mod signaling;

pub use chat::{ChatKind, ChatMessage};
pub use media::MediaState;
pub use packet::Packet;
pub use participant::{Participant, UserProfile};
pub use peer::PeerId;
pub use room::{JoinRequest, RoomId, RoomPrivacy, RoomSnapshot, TimerState};
pub use signaling::{
    ClientEvent, IceCandidate, IceServerConfig, SdpKind, ServerEvent, SessionDescription,
};
