use crate::room::{Room, RoomCommand, RoomSettings};
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use sphere_core::RoomId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<DashMap<RoomId, mpsc::Sender<RoomCommand>>>,
    settings: RoomSettings,
    command_buffer: usize,
    signaling: Arc<dyn SignalingOutput>,
}

impl RoomManager {
    pub fn new(
        settings: RoomSettings,
        command_buffer: usize,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            settings,
            command_buffer: command_buffer.max(1),
            signaling,
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn existing_sender(&self, room_id: &RoomId) -> Option<mpsc::Sender<RoomCommand>> {
        self.rooms.get(room_id).map(|tx| tx.clone())
    }

    /// Sender of a running room, starting one if needed.
    pub fn get_room_sender(&self, room_id: &RoomId) -> mpsc::Sender<RoomCommand> {
        if let Some(sender) = self.rooms.get(room_id) {
            return sender.clone();
        }

        self.rooms
            .entry(room_id.clone())
            .or_insert_with(|| self.spawn_room(room_id.clone()))
            .clone()
    }

    /// Routes a command to its room. Only a join may bring a room to life;
    /// anything else addressed to a missing room is dropped.
    pub async fn dispatch(&self, room_id: &RoomId, cmd: RoomCommand) {
        let sender = if cmd.is_join() {
            Some(self.get_room_sender(room_id))
        } else {
            self.existing_sender(room_id)
        };
        let Some(sender) = sender else {
            warn!("Dropping command for unknown room {}", room_id);
            return;
        };

        let Err(mpsc::error::SendError(cmd)) = sender.send(cmd).await else {
            return;
        };

        // The room shut down between lookup and send.
        self.rooms
            .remove_if(room_id, |_, tx| tx.same_channel(&sender));
        if cmd.is_join() {
            let _ = self.get_room_sender(room_id).send(cmd).await;
        }
    }

    fn spawn_room(&self, room_id: RoomId) -> mpsc::Sender<RoomCommand> {
        info!("Creating new room: {}", room_id);
        let (tx, rx) = mpsc::channel(self.command_buffer);
        let room = Room::new(
            room_id.clone(),
            self.settings.clone(),
            rx,
            self.signaling.clone(),
        );

        let manager = self.clone();
        let own_tx = tx.clone();
        tokio::spawn(async move {
            let leftovers = room.run().await;
            manager
                .rooms
                .remove_if(&room_id, |_, tx| tx.same_channel(&own_tx));
            info!("Room {} removed", room_id);

            for cmd in leftovers {
                manager.dispatch(&room_id, cmd).await;
            }
        });

        tx
    }
}
