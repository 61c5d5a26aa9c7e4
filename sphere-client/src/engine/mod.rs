use indexmap::IndexMap;
use sphere_core::{
    ChatMessage, IceCandidate, JoinRequest, MediaState, Participant, PeerId, ServerEvent,
    SessionDescription, TimerState,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::ClientError;
use crate::media::{LocalStream, MediaDevices, MediaEvent};
use crate::negotiation::{NegotiationState, Negotiator};
use crate::participants::ParticipantTable;
use crate::session::RoomPhase;
use crate::signaling::SignalingSink;
use crate::transport::{
    PeerConnectionState, PeerTransport, PeerTransportFactory, RemoteTrack, TransportEvent,
};

mod chat_impl;
mod create_pc_impl;
mod handle;
mod handle_remote_description_impl;
mod handle_signal_impl;
mod ice_impl;
mod media_impl;
mod renegotiate_impl;
mod room_impl;
mod transport_event_impl;

pub use handle::CallHandle;

pub(crate) const CHAT_CHANNEL: &str = "chat";

pub(crate) type Reply<T> = oneshot::Sender<Result<T, ClientError>>;

pub(crate) enum EngineCommand {
    ToggleMute(Reply<MediaState>),
    ToggleCamera(Reply<MediaState>),
    ToggleScreenShare(Reply<MediaState>),
    SendChat { text: String, reply: Reply<ChatMessage> },
    SetChatOpen { open: bool, reply: Reply<usize> },
    UpdateNotes { notes: String, reply: Reply<()> },
    UpdateTimer { timer: TimerState, reply: Reply<()> },
    RespondJoinRequest { user_id: PeerId, approved: bool, reply: Reply<()> },
    ToggleRoomLock(Reply<()>),
    AdminMute { target: PeerId, reply: Reply<()> },
    AdminRemove { target: PeerId, reply: Reply<()> },
    AdminToggleCamera { target: PeerId, reply: Reply<()> },
    DeleteRoom(Reply<()>),
    Leave(Reply<()>),
    Snapshot(oneshot::Sender<RoomView>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Everything the presentation layer needs to hear about.
#[derive(Debug, Clone, PartialEq)]
pub enum CallEvent {
    PhaseChanged(RoomPhase),
    ParticipantJoined(Participant),
    ParticipantLeft(PeerId),
    ParticipantUpdated(Participant),
    MediaChanged { user_id: PeerId, media: MediaState },
    JoinRequested(JoinRequest),
    JoinRequestsChanged(Vec<JoinRequest>),
    ChatReceived(ChatMessage),
    NotesChanged { notes: String, updated_by: Option<PeerId> },
    TimerChanged(TimerState),
    LockChanged(bool),
    RemoteTrack { peer: PeerId, track: RemoteTrack },
    ConnectionState { peer: PeerId, state: PeerConnectionState },
    /// The local screen-share tile should take focus.
    ScreenShareFocused(PeerId),
    Notice(Notice),
    Exited(RoomPhase),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerView {
    pub id: PeerId,
    pub negotiation: NegotiationState,
    pub connection: PeerConnectionState,
    pub ice_restarts: u32,
}

/// Point-in-time copy of the engine's state.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomView {
    pub phase: RoomPhase,
    pub me: Participant,
    pub participants: Vec<Participant>,
    pub peers: Vec<PeerView>,
    pub media_ready: bool,
    pub chat: Vec<ChatMessage>,
    pub unread: usize,
    pub join_requests: Vec<JoinRequest>,
    pub notes: String,
    pub timer: TimerState,
    pub locked: bool,
}

struct PeerSlot {
    transport: Arc<dyn PeerTransport>,
    negotiator: Negotiator,
    state: PeerConnectionState,
    remote_applied: bool,
    pending_candidates: Vec<IceCandidate>,
    ice_restarts: u32,
    restart_scheduled: bool,
}

/// Owns the whole call: room membership, one peer connection per remote
/// participant, local media and chat. All state is touched from `run` only.
pub struct CallEngine {
    config: EngineConfig,
    phase: RoomPhase,
    me: Participant,
    participants: ParticipantTable,
    peers: IndexMap<PeerId, PeerSlot>,
    early_candidates: HashMap<PeerId, Vec<IceCandidate>>,
    deferred_signals: Vec<(PeerId, SessionDescription)>,

    media_ready: bool,
    local_stream: Option<LocalStream>,
    camera_before_share: bool,

    chat: Vec<ChatMessage>,
    seen_messages: HashSet<Uuid>,
    chat_open: bool,
    join_requests: Vec<JoinRequest>,
    notes: String,
    timer: TimerState,
    locked: bool,

    factory: Arc<dyn PeerTransportFactory>,
    devices: Arc<dyn MediaDevices>,
    signaling: Arc<dyn SignalingSink>,

    signal_rx: mpsc::Receiver<ServerEvent>,
    command_rx: mpsc::Receiver<EngineCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    transport_tx: mpsc::Sender<TransportEvent>,
    media_rx: mpsc::Receiver<MediaEvent>,
    media_tx: mpsc::Sender<MediaEvent>,
    stream_tx: watch::Sender<Option<LocalStream>>,
    event_tx: mpsc::UnboundedSender<CallEvent>,
}

impl CallEngine {
    pub fn new(
        config: EngineConfig,
        factory: Arc<dyn PeerTransportFactory>,
        devices: Arc<dyn MediaDevices>,
        signaling: Arc<dyn SignalingSink>,
        signal_rx: mpsc::Receiver<ServerEvent>,
    ) -> (Self, CallHandle, mpsc::UnboundedReceiver<CallEvent>) {
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer);
        let (transport_tx, transport_rx) = mpsc::channel(config.transport_buffer);
        let (media_tx, media_rx) = mpsc::channel(16);
        let (stream_tx, stream_rx) = watch::channel(None);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let me = Participant::new(
            &config.user,
            MediaState {
                is_muted: config.start_muted,
                is_camera_off: config.start_camera_off,
                is_screen_sharing: false,
            },
        );

        let engine = Self {
            config,
            phase: RoomPhase::Entering,
            me,
            participants: ParticipantTable::new(),
            peers: IndexMap::new(),
            early_candidates: HashMap::new(),
            deferred_signals: Vec::new(),
            media_ready: false,
            local_stream: None,
            camera_before_share: false,
            chat: Vec::new(),
            seen_messages: HashSet::new(),
            chat_open: false,
            join_requests: Vec::new(),
            notes: String::new(),
            timer: TimerState::default(),
            locked: false,
            factory,
            devices,
            signaling,
            signal_rx,
            command_rx,
            transport_rx,
            transport_tx,
            media_rx,
            media_tx,
            stream_tx,
            event_tx,
        };

        (engine, CallHandle::new(command_tx, stream_rx), event_rx)
    }

    pub async fn run(mut self) {
        info!(
            "Call engine started: room {}, user {}",
            self.config.room_id, self.config.user.id
        );

        self.enter_room().await;
        self.start_media_acquisition();

        while !self.phase.is_terminal() {
            tokio::select! {
                biased;

                evt = self.signal_rx.recv() => {
                    match evt {
                        Some(e) => self.handle_server_event(e).await,
                        None => {
                            warn!("Signaling channel closed");
                            self.set_phase(RoomPhase::ConnectionLost);
                        }
                    }
                }

                Some(evt) = self.transport_rx.recv() => {
                    self.handle_transport_event(evt).await;
                }

                Some(evt) = self.media_rx.recv() => {
                    self.handle_media_event(evt).await;
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("All call handles dropped. Leaving room.");
                            self.leave_room().await;
                        }
                    }
                }
            }
        }

        self.teardown().await;
        info!("Call engine finished: {:?}", self.phase);
    }

    async fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::ToggleMute(reply) => {
                let _ = reply.send(self.toggle_mute().await);
            }
            EngineCommand::ToggleCamera(reply) => {
                let _ = reply.send(self.toggle_camera().await);
            }
            EngineCommand::ToggleScreenShare(reply) => {
                let _ = reply.send(self.toggle_screen_share().await);
            }
            EngineCommand::SendChat { text, reply } => {
                let _ = reply.send(self.send_chat(text).await);
            }
            EngineCommand::SetChatOpen { open, reply } => {
                let _ = reply.send(Ok(self.set_chat_open(open)));
            }
            EngineCommand::UpdateNotes { notes, reply } => {
                let _ = reply.send(self.update_notes(notes).await);
            }
            EngineCommand::UpdateTimer { timer, reply } => {
                let _ = reply.send(self.update_timer(timer).await);
            }
            EngineCommand::RespondJoinRequest {
                user_id,
                approved,
                reply,
            } => {
                let _ = reply.send(self.respond_join_request(user_id, approved).await);
            }
            EngineCommand::ToggleRoomLock(reply) => {
                let _ = reply.send(self.toggle_room_lock().await);
            }
            EngineCommand::AdminMute { target, reply } => {
                let _ = reply.send(self.admin_mute(target).await);
            }
            EngineCommand::AdminRemove { target, reply } => {
                let _ = reply.send(self.admin_remove(target).await);
            }
            EngineCommand::AdminToggleCamera { target, reply } => {
                let _ = reply.send(self.admin_toggle_camera(target).await);
            }
            EngineCommand::DeleteRoom(reply) => {
                let _ = reply.send(self.delete_room().await);
            }
            EngineCommand::Leave(reply) => {
                self.leave_room().await;
                let _ = reply.send(Ok(()));
            }
            EngineCommand::Snapshot(reply) => {
                let _ = reply.send(self.view());
            }
        }
    }

    fn set_phase(&mut self, next: RoomPhase) -> bool {
        if !self.phase.can_advance_to(&next) {
            warn!("Ignoring phase change {:?} -> {:?}", self.phase, next);
            return false;
        }
        info!("Room phase {:?} -> {:?}", self.phase, next);
        self.phase = next.clone();
        self.emit_event(CallEvent::PhaseChanged(next));
        true
    }

    fn emit_event(&self, event: CallEvent) {
        let _ = self.event_tx.send(event);
    }

    fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        self.emit_event(CallEvent::Notice(Notice {
            level,
            message: message.into(),
        }));
    }

    fn local_id(&self) -> &PeerId {
        &self.config.user.id
    }

    fn view(&self) -> RoomView {
        RoomView {
            phase: self.phase.clone(),
            me: self.me.clone(),
            participants: self.participants.to_vec(),
            peers: self
                .peers
                .iter()
                .map(|(id, slot)| PeerView {
                    id: id.clone(),
                    negotiation: slot.negotiator.state(),
                    connection: slot.state,
                    ice_restarts: slot.ice_restarts,
                })
                .collect(),
            media_ready: self.media_ready,
            chat: self.chat.clone(),
            unread: self.chat.iter().filter(|m| !m.read).count(),
            join_requests: self.join_requests.clone(),
            notes: self.notes.clone(),
            timer: self.timer,
            locked: self.locked,
        }
    }

    async fn teardown(&mut self) {
        let ids: Vec<PeerId> = self.peers.keys().cloned().collect();
        for id in ids {
            self.close_peer_connection(&id).await;
        }
        self.early_candidates.clear();
        self.deferred_signals.clear();

        if let Some(stream) = self.local_stream.take() {
            for track in stream.tracks() {
                self.devices.stop_track(track).await;
            }
        }
        self.stream_tx.send_replace(None);
        self.participants.clear();

        self.emit_event(CallEvent::Exited(self.phase.clone()));
    }
}
