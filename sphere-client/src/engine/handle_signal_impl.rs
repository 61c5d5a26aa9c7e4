use sphere_core::{ClientEvent, Participant, PeerId, RoomSnapshot, ServerEvent};
use tracing::{debug, info, warn};

use crate::engine::{CallEngine, CallEvent, NoticeLevel};
use crate::session::RoomPhase;

impl CallEngine {
    pub(super) async fn enter_room(&mut self) {
        let join = ClientEvent::JoinRoom {
            room_id: self.config.room_id.clone(),
            user: self.config.user.clone(),
            privacy: self.config.privacy,
            token: self.config.auth_token.clone(),
            media: self.me.media,
        };

        info!("Joining room {}", self.config.room_id);
        if let Err(e) = self.signaling.emit(join).await {
            warn!("Failed to send join request: {}", e);
            self.notify(NoticeLevel::Error, "Could not reach the signaling server");
            self.set_phase(RoomPhase::ConnectionLost);
        }
    }

    pub(super) async fn handle_server_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::RoomState { room } => self.apply_room_state(room),

            ServerEvent::RoomJoinedSuccessfully { you, participants }
            | ServerEvent::JoinApproved { you, participants } => {
                self.on_admitted(you, participants).await;
            }

            ServerEvent::JoinRequestPending { room_id } => {
                info!("Waiting for an admin of {} to approve us", room_id);
                self.set_phase(RoomPhase::Pending);
            }

            ServerEvent::JoinRejected { reason } => {
                let text = reason.as_deref().unwrap_or("no reason given");
                self.notify(NoticeLevel::Error, format!("Join rejected: {}", text));
                self.set_phase(RoomPhase::Rejected { reason });
            }

            ServerEvent::UserConnected { participant } => {
                self.on_user_connected(participant).await;
            }

            ServerEvent::UserDisconnected { user_id } => {
                self.on_user_disconnected(&user_id).await;
            }

            ServerEvent::ParticipantUpdated { participant } => {
                self.on_participant_updated(participant);
            }

            ServerEvent::NewJoinRequest { request } => {
                if !self.join_requests.iter().any(|r| r.user_id == request.user_id) {
                    self.join_requests.push(request.clone());
                }
                self.emit_event(CallEvent::JoinRequested(request));
            }

            ServerEvent::UpdateJoinRequests { requests } => {
                self.join_requests = requests.clone();
                self.emit_event(CallEvent::JoinRequestsChanged(requests));
            }

            ServerEvent::MediaStateChanged { user_id, media } => {
                self.apply_remote_media(&user_id, media);
            }

            ServerEvent::NotesUpdate { notes, updated_by } => {
                self.notes = notes.clone();
                self.emit_event(CallEvent::NotesChanged { notes, updated_by });
            }

            ServerEvent::TimerUpdate { timer } => {
                self.timer = timer;
                self.emit_event(CallEvent::TimerChanged(timer));
            }

            ServerEvent::ChatMessage { message } => self.accept_chat(message),

            ServerEvent::Signal { from, description } => {
                debug!("Received {:?} from {}", description.kind, from);
                self.handle_remote_description(from, description).await;
            }

            ServerEvent::IceCandidate { from, candidate } => {
                self.handle_ice_candidate(from, candidate).await;
            }

            ServerEvent::KickedFromRoom { reason } => {
                let text = reason.as_deref().unwrap_or("no reason given");
                self.notify(NoticeLevel::Error, format!("Removed from room: {}", text));
                self.set_phase(RoomPhase::Kicked { reason });
            }

            ServerEvent::RoomDeleted => {
                self.notify(NoticeLevel::Error, "The room was deleted by its creator");
                self.set_phase(RoomPhase::RoomDeleted);
            }

            ServerEvent::RoomLockStatus { locked } => {
                self.locked = locked;
                self.emit_event(CallEvent::LockChanged(locked));
            }

            ServerEvent::AdminMuted { by } => self.on_admin_muted(by).await,

            ServerEvent::AdminCameraToggled { by } => self.on_admin_camera_toggled(by).await,

            ServerEvent::Error { message } => {
                warn!("Server error: {}", message);
                self.notify(NoticeLevel::Error, message);
            }
        }
    }

    fn apply_room_state(&mut self, room: RoomSnapshot) {
        self.notes = room.notes;
        self.timer = room.timer;
        self.locked = room.locked;
        self.join_requests = room.join_requests;

        for participant in room.participants {
            if participant.id == *self.local_id() {
                self.me.is_admin = participant.is_admin;
                self.me.is_creator = participant.is_creator;
            } else if self.participants.contains(&participant.id) {
                self.participants.upsert(participant);
            }
        }

        for mut message in room.chat {
            if self.seen_messages.insert(message.id) {
                message.read = true;
                self.chat.push(message);
            }
        }
    }

    async fn on_admitted(&mut self, you: Participant, participants: Vec<Participant>) {
        if !self.set_phase(RoomPhase::Joined) {
            return;
        }
        self.me.is_admin = you.is_admin;
        self.me.is_creator = you.is_creator;

        info!(
            "Joined room {} with {} other participant(s)",
            self.config.room_id,
            participants.len()
        );

        for participant in participants {
            if participant.id == *self.local_id() {
                continue;
            }
            let id = participant.id.clone();
            if self.participants.upsert(participant.clone()) {
                self.emit_event(CallEvent::ParticipantJoined(participant));
            }
            if let Err(e) = self.create_peer_connection(id.clone(), true).await {
                warn!("Failed to create peer connection to {}: {}", id, e);
            }
        }

        self.broadcast_media_state().await;
    }

    async fn on_user_connected(&mut self, participant: Participant) {
        if participant.id == *self.local_id() {
            return;
        }
        let id = participant.id.clone();
        if self.participants.upsert(participant.clone()) {
            info!("{} joined the call", participant.name);
            self.emit_event(CallEvent::ParticipantJoined(participant));
        }
        if self.phase.is_joined() {
            if let Err(e) = self.create_peer_connection(id.clone(), false).await {
                warn!("Failed to create peer connection to {}: {}", id, e);
            }
        }
    }

    async fn on_user_disconnected(&mut self, user_id: &PeerId) {
        if let Some(participant) = self.participants.remove(user_id) {
            info!("{} left the call", participant.name);
            self.emit_event(CallEvent::ParticipantLeft(user_id.clone()));
        }
        self.close_peer_connection(user_id).await;
    }

    fn on_participant_updated(&mut self, participant: Participant) {
        if participant.id == *self.local_id() {
            let promoted = participant.is_admin && !self.me.is_admin;
            self.me.is_admin = participant.is_admin;
            self.me.is_creator = participant.is_creator;
            if promoted {
                self.notify(NoticeLevel::Info, "You are now an admin of this room");
            }
            return;
        }
        self.participants.upsert(participant.clone());
        self.emit_event(CallEvent::ParticipantUpdated(participant));
    }

    async fn on_admin_muted(&mut self, by: PeerId) {
        info!("Muted by admin {}", by);
        if !self.me.media.is_muted && self.local_stream.is_some() {
            if let Err(e) = self.toggle_mute().await {
                warn!("Admin mute failed: {}", e);
            }
        }
        self.notify(NoticeLevel::Info, "An admin muted your microphone");
    }

    async fn on_admin_camera_toggled(&mut self, by: PeerId) {
        info!("Camera toggled by admin {}", by);
        if self.me.media.is_screen_sharing {
            debug!("Ignoring admin camera toggle while screen sharing");
            return;
        }
        match self.toggle_camera().await {
            Ok(media) => {
                let state = if media.is_camera_off { "off" } else { "on" };
                self.notify(
                    NoticeLevel::Info,
                    format!("An admin turned your camera {}", state),
                );
            }
            Err(e) => warn!("Admin camera toggle failed: {}", e),
        }
    }
}
