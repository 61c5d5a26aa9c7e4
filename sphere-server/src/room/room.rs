use crate::room::room_command::RoomCommand;
use crate::room::room_state::{Outbox, RoomSettings, RoomState};
use crate::signaling::SignalingOutput;
use sphere_core::RoomId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Actor owning one [`RoomState`]. Stops as soon as the room has neither
/// members nor pending requests.
pub struct Room {
    state: RoomState,
    command_rx: mpsc::Receiver<RoomCommand>,
    signaling: Arc<dyn SignalingOutput>,
}

impl Room {
    pub fn new(
        room_id: RoomId,
        settings: RoomSettings,
        command_rx: mpsc::Receiver<RoomCommand>,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Self {
        Self {
            state: RoomState::new(room_id, settings),
            command_rx,
            signaling,
        }
    }

    /// Runs the event loop. Commands still queued when the room empties are
    /// returned so the caller can hand them to a fresh room.
    pub async fn run(mut self) -> Vec<RoomCommand> {
        info!("Room {} event loop started", self.state.room_id());

        loop {
            match self.command_rx.recv().await {
                Some(cmd) => {
                    self.handle_command(cmd).await;
                    if self.state.is_empty() {
                        info!("Room {} is empty. Shutting down.", self.state.room_id());
                        break;
                    }
                }
                None => {
                    info!("Command channel closed. Shutting down room.");
                    break;
                }
            }
        }

        self.command_rx.close();
        let mut leftovers = Vec::new();
        while let Ok(cmd) = self.command_rx.try_recv() {
            leftovers.push(cmd);
        }
        if !leftovers.is_empty() {
            debug!(
                "Room {} handing over {} queued commands",
                self.state.room_id(),
                leftovers.len()
            );
        }

        info!("Room {} event loop finished", self.state.room_id());
        leftovers
    }

    async fn handle_command(&mut self, cmd: RoomCommand) {
        let out = match cmd {
            RoomCommand::Join {
                user,
                privacy,
                token,
                media,
            } => {
                info!("Processing join for {} ({})", user.name, user.id);
                self.state.join(user, privacy, token, media)
            }

            RoomCommand::Event { peer_id, event } => self.state.handle_event(&peer_id, event),

            RoomCommand::Disconnect { peer_id } => {
                info!("Peer {} disconnected", peer_id);
                self.state.leave(&peer_id)
            }
        };

        self.deliver(out).await;
    }

    async fn deliver(&self, out: Outbox) {
        for (peer_id, event) in out {
            self.signaling.send(&peer_id, event).await;
        }
    }
}
