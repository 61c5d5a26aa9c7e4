use crate::model::chat::ChatMessage;
use crate::model::media::MediaState;
use crate::model::participant::{Participant, UserProfile};
use crate::model::peer::PeerId;
use crate::model::room::{JoinRequest, RoomId, RoomPrivacy, RoomSnapshot, TimerState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SdpKind {
    Offer,
    Answer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceCandidate {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_m_line_index: Option<u16>,
}

/// Events a participant emits on the room signaling channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    JoinRoom {
        room_id: RoomId,
        user: UserProfile,
        #[serde(default)]
        privacy: RoomPrivacy,
        token: Option<String>,
        #[serde(default)]
        media: MediaState,
    },
    MediaStateUpdate {
        media: MediaState,
    },
    ScreenShareStart,
    ScreenShareStop,
    Signal {
        to: PeerId,
        description: SessionDescription,
    },
    IceCandidate {
        to: PeerId,
        candidate: IceCandidate,
    },
    NotesUpdate {
        notes: String,
    },
    TimerUpdate {
        timer: TimerState,
    },
    ChatMessage {
        message: ChatMessage,
    },
    JoinRequestResponse {
        user_id: PeerId,
        approved: bool,
    },
    ToggleRoomLock,
    AdminMuteParticipant {
        target: PeerId,
    },
    AdminRemoveParticipant {
        target: PeerId,
    },
    AdminToggleParticipantCamera {
        target: PeerId,
    },
    DeleteRoom,
    LeaveRoom,
}

/// Events the relay delivers to a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    RoomState {
        room: RoomSnapshot,
    },
    /// `participants` never contains the recipient.
    RoomJoinedSuccessfully {
        you: Participant,
        participants: Vec<Participant>,
    },
    JoinRequestPending {
        room_id: RoomId,
    },
    JoinApproved {
        you: Participant,
        participants: Vec<Participant>,
    },
    JoinRejected {
        reason: Option<String>,
    },
    UserConnected {
        participant: Participant,
    },
    UserDisconnected {
        user_id: PeerId,
    },
    ParticipantUpdated {
        participant: Participant,
    },
    NewJoinRequest {
        request: JoinRequest,
    },
    UpdateJoinRequests {
        requests: Vec<JoinRequest>,
    },
    MediaStateChanged {
        user_id: PeerId,
        media: MediaState,
    },
    NotesUpdate {
        notes: String,
        updated_by: Option<PeerId>,
    },
    TimerUpdate {
        timer: TimerState,
    },
    ChatMessage {
        message: ChatMessage,
    },
    Signal {
        from: PeerId,
        description: SessionDescription,
    },
    IceCandidate {
        from: PeerId,
        candidate: IceCandidate,
    },
    KickedFromRoom {
        reason: Option<String>,
    },
    RoomDeleted,
    RoomLockStatus {
        locked: bool,
    },
    AdminMuted {
        by: PeerId,
    },
    AdminCameraToggled {
        by: PeerId,
    },
    Error {
        message: String,
    },
}
