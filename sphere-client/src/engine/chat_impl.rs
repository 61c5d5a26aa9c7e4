use sphere_core::{ChatMessage, ClientEvent, Packet};
use tracing::{debug, warn};

use crate::engine::{CallEngine, CallEvent, NoticeLevel};
use crate::error::ClientError;

impl CallEngine {
    pub(super) async fn send_chat(&mut self, text: String) -> Result<ChatMessage, ClientError> {
        self.require_joined()?;

        let message = ChatMessage::text(&self.config.user, text);
        self.seen_messages.insert(message.id);
        self.chat.push(message.clone());

        let event = ClientEvent::ChatMessage {
            message: message.clone(),
        };
        if let Err(e) = self.signaling.emit(event).await {
            warn!("Chat over signaling failed ({}), using data channels", e);
            let delivered = self.broadcast_packet(&Packet::Chat(message.clone())).await;
            if delivered == 0 {
                self.notify(NoticeLevel::Warning, "Message could not be delivered");
            }
        }
        Ok(message)
    }

    /// Drops our own echoes and anything already seen on another path.
    pub(super) fn accept_chat(&mut self, mut message: ChatMessage) {
        if message.user_id == *self.local_id() {
            debug!("Dropping echo of our own message {}", message.id);
            return;
        }
        if !self.seen_messages.insert(message.id) {
            return;
        }
        message.read = self.chat_open;
        self.chat.push(message.clone());
        self.emit_event(CallEvent::ChatReceived(message));
    }

    /// Returns how many messages were marked read.
    pub(super) fn set_chat_open(&mut self, open: bool) -> usize {
        self.chat_open = open;
        if !open {
            return 0;
        }
        let mut marked = 0;
        for message in self.chat.iter_mut().filter(|m| !m.read) {
            message.read = true;
            marked += 1;
        }
        marked
    }
}
