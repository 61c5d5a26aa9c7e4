use sphere_core::{ChatMessage, MediaState, PeerId, TimerState};
use tokio::sync::{mpsc, oneshot, watch};

use crate::engine::{EngineCommand, Reply, RoomView};
use crate::error::ClientError;
use crate::media::LocalStream;

/// Cloneable front door to a running [`CallEngine`](crate::CallEngine).
#[derive(Clone)]
pub struct CallHandle {
    command_tx: mpsc::Sender<EngineCommand>,
    stream_rx: watch::Receiver<Option<LocalStream>>,
}

impl CallHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<EngineCommand>,
        stream_rx: watch::Receiver<Option<LocalStream>>,
    ) -> Self {
        Self {
            command_tx,
            stream_rx,
        }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> EngineCommand,
    ) -> Result<T, ClientError> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(build(tx))
            .await
            .map_err(|_| ClientError::EngineStopped)?;
        rx.await.map_err(|_| ClientError::EngineStopped)?
    }

    pub async fn toggle_mute(&self) -> Result<MediaState, ClientError> {
        self.request(EngineCommand::ToggleMute).await
    }

    pub async fn toggle_camera(&self) -> Result<MediaState, ClientError> {
        self.request(EngineCommand::ToggleCamera).await
    }

    pub async fn toggle_screen_share(&self) -> Result<MediaState, ClientError> {
        self.request(EngineCommand::ToggleScreenShare).await
    }

    pub async fn send_chat(&self, text: impl Into<String>) -> Result<ChatMessage, ClientError> {
        let text = text.into();
        self.request(|reply| EngineCommand::SendChat { text, reply })
            .await
    }

    /// Opening the chat marks everything read. Returns the number marked.
    pub async fn set_chat_open(&self, open: bool) -> Result<usize, ClientError> {
        self.request(|reply| EngineCommand::SetChatOpen { open, reply })
            .await
    }

    pub async fn update_notes(&self, notes: impl Into<String>) -> Result<(), ClientError> {
        let notes = notes.into();
        self.request(|reply| EngineCommand::UpdateNotes { notes, reply })
            .await
    }

    pub async fn update_timer(&self, timer: TimerState) -> Result<(), ClientError> {
        self.request(|reply| EngineCommand::UpdateTimer { timer, reply })
            .await
    }

    pub async fn respond_join_request(
        &self,
        user_id: PeerId,
        approved: bool,
    ) -> Result<(), ClientError> {
        self.request(|reply| EngineCommand::RespondJoinRequest {
            user_id,
            approved,
            reply,
        })
        .await
    }

    pub async fn toggle_room_lock(&self) -> Result<(), ClientError> {
        self.request(EngineCommand::ToggleRoomLock).await
    }

    pub async fn admin_mute(&self, target: PeerId) -> Result<(), ClientError> {
        self.request(|reply| EngineCommand::AdminMute { target, reply })
            .await
    }

    pub async fn admin_remove(&self, target: PeerId) -> Result<(), ClientError> {
        self.request(|reply| EngineCommand::AdminRemove { target, reply })
            .await
    }

    pub async fn admin_toggle_camera(&self, target: PeerId) -> Result<(), ClientError> {
        self.request(|reply| EngineCommand::AdminToggleCamera { target, reply })
            .await
    }

    pub async fn delete_room(&self) -> Result<(), ClientError> {
        self.request(EngineCommand::DeleteRoom).await
    }

    pub async fn leave(&self) -> Result<(), ClientError> {
        self.request(EngineCommand::Leave).await
    }

    pub async fn snapshot(&self) -> Result<RoomView, ClientError> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(EngineCommand::Snapshot(tx))
            .await
            .map_err(|_| ClientError::EngineStopped)?;
        rx.await.map_err(|_| ClientError::EngineStopped)
    }

    /// Watches the currently published local stream.
    pub fn local_stream(&self) -> watch::Receiver<Option<LocalStream>> {
        self.stream_rx.clone()
    }
}
