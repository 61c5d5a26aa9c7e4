use sphere_core::{ClientEvent, PeerId, TimerState};
use tracing::info;

use crate::engine::CallEngine;
use crate::error::ClientError;
use crate::session::RoomPhase;

impl CallEngine {
    pub(super) fn require_joined(&self) -> Result<(), ClientError> {
        if self.phase.is_joined() {
            Ok(())
        } else {
            Err(ClientError::WrongPhase(self.phase.clone()))
        }
    }

    fn require_admin(&self) -> Result<(), ClientError> {
        self.require_joined()?;
        if self.me.is_admin {
            Ok(())
        } else {
            Err(ClientError::NotAdmin)
        }
    }

    fn require_participant(&self, target: &PeerId) -> Result<(), ClientError> {
        if self.participants.contains(target) {
            Ok(())
        } else {
            Err(ClientError::UnknownParticipant(target.clone()))
        }
    }

    pub(super) async fn update_notes(&mut self, notes: String) -> Result<(), ClientError> {
        self.require_joined()?;
        self.notes = notes.clone();
        self.signaling.emit(ClientEvent::NotesUpdate { notes }).await?;
        Ok(())
    }

    pub(super) async fn update_timer(&mut self, timer: TimerState) -> Result<(), ClientError> {
        self.require_joined()?;
        self.timer = timer;
        self.signaling.emit(ClientEvent::TimerUpdate { timer }).await?;
        Ok(())
    }

    pub(super) async fn respond_join_request(
        &mut self,
        user_id: PeerId,
        approved: bool,
    ) -> Result<(), ClientError> {
        self.require_admin()?;
        self.join_requests.retain(|r| r.user_id != user_id);
        info!(
            "{} join request from {}",
            if approved { "Approving" } else { "Rejecting" },
            user_id
        );
        self.signaling
            .emit(ClientEvent::JoinRequestResponse { user_id, approved })
            .await?;
        Ok(())
    }

    pub(super) async fn toggle_room_lock(&mut self) -> Result<(), ClientError> {
        self.require_admin()?;
        self.signaling.emit(ClientEvent::ToggleRoomLock).await?;
        Ok(())
    }

    pub(super) async fn admin_mute(&mut self, target: PeerId) -> Result<(), ClientError> {
        self.require_admin()?;
        self.require_participant(&target)?;
        self.signaling
            .emit(ClientEvent::AdminMuteParticipant { target })
            .await?;
        Ok(())
    }

    pub(super) async fn admin_remove(&mut self, target: PeerId) -> Result<(), ClientError> {
        self.require_admin()?;
        self.require_participant(&target)?;
        self.signaling
            .emit(ClientEvent::AdminRemoveParticipant { target })
            .await?;
        Ok(())
    }

    pub(super) async fn admin_toggle_camera(&mut self, target: PeerId) -> Result<(), ClientError> {
        self.require_admin()?;
        self.require_participant(&target)?;
        self.signaling
            .emit(ClientEvent::AdminToggleParticipantCamera { target })
            .await?;
        Ok(())
    }

    pub(super) async fn delete_room(&mut self) -> Result<(), ClientError> {
        self.require_joined()?;
        if !self.me.is_creator {
            return Err(ClientError::NotCreator);
        }
        self.signaling.emit(ClientEvent::DeleteRoom).await?;
        Ok(())
    }

    pub(super) async fn leave_room(&mut self) {
        if self.phase.is_terminal() {
            return;
        }
        self.emit_signal(ClientEvent::LeaveRoom).await;
        self.set_phase(RoomPhase::Left);
    }
}
