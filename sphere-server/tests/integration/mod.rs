pub mod relay_tests;
pub mod websocket_tests;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Level;

use sphere_core::{MediaState, PeerId, RoomId, RoomPrivacy, ServerEvent, UserProfile};
use sphere_server::{Room, RoomCommand, RoomSettings};

use crate::utils::MockSignalingOutput;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub struct TestRoom {
    pub cmd_tx: mpsc::Sender<RoomCommand>,
    pub signal_rx: mpsc::UnboundedReceiver<(PeerId, ServerEvent)>,
    pub signaling: MockSignalingOutput,
    pub task: JoinHandle<Vec<RoomCommand>>,
}

impl TestRoom {
    pub async fn join(&self, user: &UserProfile, privacy: RoomPrivacy) {
        self.cmd_tx
            .send(RoomCommand::Join {
                user: user.clone(),
                privacy,
                token: None,
                media: MediaState::default(),
            })
            .await
            .expect("Room stopped");
    }

    pub async fn event(&self, peer_id: &PeerId, event: sphere_core::ClientEvent) {
        self.cmd_tx
            .send(RoomCommand::Event {
                peer_id: peer_id.clone(),
                event,
            })
            .await
            .expect("Room stopped");
    }
}

pub fn create_test_room(settings: RoomSettings) -> TestRoom {
    let (cmd_tx, cmd_rx) = mpsc::channel::<RoomCommand>(100);
    let (signaling, signal_rx) = MockSignalingOutput::new();

    let room = Room::new(
        RoomId::from("study-room"),
        settings,
        cmd_rx,
        std::sync::Arc::new(signaling.clone()),
    );
    let task = tokio::spawn(room.run());

    TestRoom {
        cmd_tx,
        signal_rx,
        signaling,
        task,
    }
}
