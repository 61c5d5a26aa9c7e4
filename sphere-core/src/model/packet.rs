use crate::model::chat::ChatMessage;
use crate::model::media::MediaState;
use serde::{Deserialize, Serialize};

/// Frames carried on the peer-to-peer `chat` data channel (postcard encoded).
/// Used when the signaling channel cannot deliver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Packet {
    Chat(ChatMessage),
    MediaState(MediaState),
}
