use chrono::Utc;
use indexmap::IndexMap;
use sphere_core::{
    ChatKind, ChatMessage, ClientEvent, JoinRequest, MediaState, Participant, PeerId, RoomId,
    RoomPrivacy, RoomSnapshot, ServerEvent, TimerState, UserProfile,
};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Messages produced by one state transition, in delivery order.
pub type Outbox = Vec<(PeerId, ServerEvent)>;

#[derive(Debug, Clone)]
pub struct RoomSettings {
    pub capacity: usize,
    pub chat_history: usize,
    pub access_token: Option<String>,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            capacity: 12,
            chat_history: 200,
            access_token: None,
        }
    }
}

struct PendingJoin {
    request: JoinRequest,
    media: MediaState,
}

/// Membership, admission queue and shared study state of one room.
///
/// Members are kept in arrival order; the first entry is the longest present
/// and is the one promoted when the last admin leaves.
pub struct RoomState {
    room_id: RoomId,
    settings: RoomSettings,
    privacy: RoomPrivacy,
    locked: bool,
    notes: String,
    timer: TimerState,
    members: IndexMap<PeerId, Participant>,
    pending: IndexMap<PeerId, PendingJoin>,
    chat: VecDeque<ChatMessage>,
}

impl RoomState {
    pub fn new(room_id: RoomId, settings: RoomSettings) -> Self {
        Self {
            room_id,
            settings,
            privacy: RoomPrivacy::Public,
            locked: false,
            notes: String::new(),
            timer: TimerState::default(),
            members: IndexMap::new(),
            pending: IndexMap::new(),
            chat: VecDeque::new(),
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.pending.is_empty()
    }

    pub fn member(&self, id: &PeerId) -> Option<&Participant> {
        self.members.get(id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_pending(&self, id: &PeerId) -> bool {
        self.pending.contains_key(id)
    }

    pub fn join(
        &mut self,
        user: UserProfile,
        privacy: RoomPrivacy,
        token: Option<String>,
        media: MediaState,
    ) -> Outbox {
        let mut out = Outbox::new();

        if let Some(expected) = &self.settings.access_token {
            if token.as_deref() != Some(expected.as_str()) {
                warn!("Rejecting {} from {}: bad access token", user.id, self.room_id);
                out.push((user.id, rejected("Invalid access token")));
                return out;
            }
        }

        if let Some(previous) = self.members.shift_remove(&user.id) {
            info!("{} rejoined room {}", user.name, self.room_id);
            self.broadcast(
                &mut out,
                ServerEvent::UserDisconnected {
                    user_id: user.id.clone(),
                },
            );
            let mut participant = Participant::new(&user, media);
            participant.is_admin = previous.is_admin;
            participant.is_creator = previous.is_creator;
            self.admit(&mut out, participant, false);
            return out;
        }

        if self.members.is_empty() {
            info!("{} created room {} ({:?})", user.name, self.room_id, privacy);
            self.privacy = privacy;
            let mut participant = Participant::new(&user, media);
            participant.is_admin = true;
            participant.is_creator = true;
            self.admit(&mut out, participant, false);
            return out;
        }

        if self.members.len() >= self.settings.capacity {
            out.push((user.id, rejected("Room is full")));
            return out;
        }

        if self.privacy == RoomPrivacy::Private || self.locked {
            info!("{} asks to join room {}", user.name, self.room_id);
            let request = JoinRequest {
                user_id: user.id.clone(),
                username: user.name.clone(),
                requested_at: Utc::now(),
            };
            self.pending.insert(
                user.id.clone(),
                PendingJoin {
                    request: request.clone(),
                    media,
                },
            );
            out.push((
                user.id,
                ServerEvent::JoinRequestPending {
                    room_id: self.room_id.clone(),
                },
            ));
            for admin in self.admin_ids() {
                out.push((
                    admin,
                    ServerEvent::NewJoinRequest {
                        request: request.clone(),
                    },
                ));
            }
            self.notify_admins_of_requests(&mut out);
            return out;
        }

        self.admit(&mut out, Participant::new(&user, media), false);
        out
    }

    /// Member leaving or disconnecting, or a requester giving up.
    pub fn leave(&mut self, id: &PeerId) -> Outbox {
        let mut out = Outbox::new();

        if self.pending.shift_remove(id).is_some() {
            debug!("Join request from {} withdrawn", id);
            self.notify_admins_of_requests(&mut out);
            return out;
        }

        let Some(left) = self.members.shift_remove(id) else {
            return out;
        };
        info!("{} left room {}", left.name, self.room_id);
        self.broadcast(
            &mut out,
            ServerEvent::UserDisconnected {
                user_id: id.clone(),
            },
        );

        if self.members.is_empty() {
            for (requester, _) in self.pending.drain(..) {
                out.push((requester, rejected("The room is empty")));
            }
            return out;
        }

        if left.is_admin && !self.members.values().any(|m| m.is_admin) {
            self.promote_longest_present(&mut out);
        }
        out
    }

    pub fn handle_event(&mut self, from: &PeerId, event: ClientEvent) -> Outbox {
        if !self.members.contains_key(from) {
            if matches!(event, ClientEvent::LeaveRoom) {
                return self.leave(from);
            }
            return denied(from, "Not a member of this room");
        }

        let mut out = Outbox::new();
        match event {
            ClientEvent::JoinRoom { .. } => {
                warn!("join-room from {} routed as a room event", from);
            }

            ClientEvent::MediaStateUpdate { media } => {
                self.update_media(&mut out, from, |m| *m = media);
            }

            ClientEvent::ScreenShareStart => {
                self.update_media(&mut out, from, |m| {
                    m.is_screen_sharing = true;
                    m.is_camera_off = true;
                });
            }

            ClientEvent::ScreenShareStop => {
                self.update_media(&mut out, from, |m| m.is_screen_sharing = false);
            }

            ClientEvent::Signal { to, description } => {
                if self.members.contains_key(&to) {
                    out.push((
                        to,
                        ServerEvent::Signal {
                            from: from.clone(),
                            description,
                        },
                    ));
                } else {
                    debug!("Dropping signal from {} to absent {}", from, to);
                }
            }

            ClientEvent::IceCandidate { to, candidate } => {
                if self.members.contains_key(&to) {
                    out.push((
                        to,
                        ServerEvent::IceCandidate {
                            from: from.clone(),
                            candidate,
                        },
                    ));
                }
            }

            ClientEvent::NotesUpdate { notes } => {
                self.notes = notes.clone();
                self.broadcast_except(
                    &mut out,
                    from,
                    ServerEvent::NotesUpdate {
                        notes,
                        updated_by: Some(from.clone()),
                    },
                );
            }

            ClientEvent::TimerUpdate { timer } => {
                self.timer = timer;
                self.broadcast_except(&mut out, from, ServerEvent::TimerUpdate { timer });
            }

            ClientEvent::ChatMessage { mut message } => {
                let author = self
                    .members
                    .get(from)
                    .map(|m| m.name.clone())
                    .unwrap_or_default();
                message.user_id = from.clone();
                message.username = author;
                message.kind = ChatKind::Text;
                message.read = false;

                self.chat.push_back(message.clone());
                while self.chat.len() > self.settings.chat_history {
                    self.chat.pop_front();
                }
                self.broadcast(&mut out, ServerEvent::ChatMessage { message });
            }

            ClientEvent::JoinRequestResponse { user_id, approved } => {
                if !self.is_admin(from) {
                    return denied(from, "Only admins can answer join requests");
                }
                return self.answer_join_request(&user_id, approved);
            }

            ClientEvent::ToggleRoomLock => {
                if !self.is_admin(from) {
                    return denied(from, "Only admins can lock the room");
                }
                self.locked = !self.locked;
                info!("Room {} locked: {}", self.room_id, self.locked);
                self.broadcast(
                    &mut out,
                    ServerEvent::RoomLockStatus {
                        locked: self.locked,
                    },
                );
            }

            ClientEvent::AdminMuteParticipant { target } => {
                if !self.is_admin(from) {
                    return denied(from, "Only admins can mute participants");
                }
                if !self.members.contains_key(&target) {
                    return denied(from, "Unknown participant");
                }
                out.push((target, ServerEvent::AdminMuted { by: from.clone() }));
            }

            ClientEvent::AdminToggleParticipantCamera { target } => {
                if !self.is_admin(from) {
                    return denied(from, "Only admins can toggle cameras");
                }
                if !self.members.contains_key(&target) {
                    return denied(from, "Unknown participant");
                }
                out.push((
                    target,
                    ServerEvent::AdminCameraToggled { by: from.clone() },
                ));
            }

            ClientEvent::AdminRemoveParticipant { target } => {
                if !self.is_admin(from) {
                    return denied(from, "Only admins can remove participants");
                }
                let Some(victim) = self.members.get(&target) else {
                    return denied(from, "Unknown participant");
                };
                if victim.is_creator {
                    return denied(from, "The room creator cannot be removed");
                }
                info!("{} removed {} from room {}", from, target, self.room_id);
                out.push((
                    target.clone(),
                    ServerEvent::KickedFromRoom {
                        reason: Some("Removed by an admin".into()),
                    },
                ));
                out.extend(self.leave(&target));
            }

            ClientEvent::DeleteRoom => {
                if !self.members.get(from).is_some_and(|m| m.is_creator) {
                    return denied(from, "Only the room creator can delete the room");
                }
                info!("Room {} deleted by {}", self.room_id, from);
                for id in self.members.keys() {
                    out.push((id.clone(), ServerEvent::RoomDeleted));
                }
                for (requester, _) in self.pending.drain(..) {
                    out.push((requester, rejected("The room was deleted")));
                }
                self.members.clear();
                self.chat.clear();
            }

            ClientEvent::LeaveRoom => return self.leave(from),
        }
        out
    }

    /// Room snapshot as seen by `viewer`. Join requests only go to admins.
    pub fn snapshot_for(&self, viewer: &PeerId) -> RoomSnapshot {
        let join_requests = if self.is_admin(viewer) {
            self.pending.values().map(|p| p.request.clone()).collect()
        } else {
            Vec::new()
        };
        RoomSnapshot {
            room_id: self.room_id.clone(),
            privacy: self.privacy,
            locked: self.locked,
            notes: self.notes.clone(),
            timer: self.timer,
            participants: self.members.values().cloned().collect(),
            join_requests,
            chat: self.chat.iter().cloned().collect(),
        }
    }

    fn answer_join_request(&mut self, user_id: &PeerId, approved: bool) -> Outbox {
        let mut out = Outbox::new();
        let Some(pending) = self.pending.shift_remove(user_id) else {
            debug!("No pending request from {}", user_id);
            return out;
        };

        if !approved {
            info!("Join request from {} declined", user_id);
            out.push((user_id.clone(), rejected("Your request to join was declined")));
        } else if self.members.len() >= self.settings.capacity {
            out.push((user_id.clone(), rejected("Room is full")));
        } else {
            info!("Join request from {} approved", user_id);
            let profile = UserProfile {
                id: user_id.clone(),
                name: pending.request.username,
            };
            self.admit(&mut out, Participant::new(&profile, pending.media), true);
        }

        self.notify_admins_of_requests(&mut out);
        out
    }

    fn admit(&mut self, out: &mut Outbox, participant: Participant, approved: bool) {
        let others: Vec<Participant> = self.members.values().cloned().collect();
        let id = participant.id.clone();
        self.members.insert(id.clone(), participant.clone());

        let admitted = if approved {
            ServerEvent::JoinApproved {
                you: participant.clone(),
                participants: others,
            }
        } else {
            ServerEvent::RoomJoinedSuccessfully {
                you: participant.clone(),
                participants: others,
            }
        };
        out.push((id.clone(), admitted));
        out.push((
            id.clone(),
            ServerEvent::RoomState {
                room: self.snapshot_for(&id),
            },
        ));
        self.broadcast_except(out, &id, ServerEvent::UserConnected { participant });
    }

    fn promote_longest_present(&mut self, out: &mut Outbox) {
        let Some((id, member)) = self.members.first_mut() else {
            return;
        };
        member.is_admin = true;
        let id = id.clone();
        let participant = member.clone();
        info!("{} is now admin of room {}", participant.name, self.room_id);

        self.broadcast(out, ServerEvent::ParticipantUpdated { participant });
        out.push((
            id.clone(),
            ServerEvent::RoomState {
                room: self.snapshot_for(&id),
            },
        ));
    }

    fn update_media(&mut self, out: &mut Outbox, from: &PeerId, apply: impl FnOnce(&mut MediaState)) {
        let Some(member) = self.members.get_mut(from) else {
            return;
        };
        apply(&mut member.media);
        let media = member.media;
        self.broadcast_except(
            out,
            from,
            ServerEvent::MediaStateChanged {
                user_id: from.clone(),
                media,
            },
        );
    }

    fn notify_admins_of_requests(&self, out: &mut Outbox) {
        let requests: Vec<JoinRequest> = self.pending.values().map(|p| p.request.clone()).collect();
        for admin in self.admin_ids() {
            out.push((
                admin,
                ServerEvent::UpdateJoinRequests {
                    requests: requests.clone(),
                },
            ));
        }
    }

    fn is_admin(&self, id: &PeerId) -> bool {
        self.members.get(id).is_some_and(|m| m.is_admin)
    }

    fn admin_ids(&self) -> Vec<PeerId> {
        self.members
            .values()
            .filter(|m| m.is_admin)
            .map(|m| m.id.clone())
            .collect()
    }

    fn broadcast(&self, out: &mut Outbox, event: ServerEvent) {
        for id in self.members.keys() {
            out.push((id.clone(), event.clone()));
        }
    }

    fn broadcast_except(&self, out: &mut Outbox, skip: &PeerId, event: ServerEvent) {
        for id in self.members.keys().filter(|id| *id != skip) {
            out.push((id.clone(), event.clone()));
        }
    }
}

fn rejected(reason: &str) -> ServerEvent {
    ServerEvent::JoinRejected {
        reason: Some(reason.to_owned()),
    }
}

fn denied(to: &PeerId, message: &str) -> Outbox {
    vec![(
        to.clone(),
        ServerEvent::Error {
            message: message.to_owned(),
        },
    )]
}
