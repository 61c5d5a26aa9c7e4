use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use sphere_core::{ClientEvent, PeerId, ServerEvent};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::error::SignalingError;
use crate::signaling::SignalingSink;

const INBOUND_BUFFER: usize = 256;

/// WebSocket connection to the relay at `{base_url}/ws/{peer_id}`.
#[derive(Clone)]
pub struct WsSignaling {
    tx: mpsc::UnboundedSender<Message>,
}

impl WsSignaling {
    /// Returns the sink plus the stream of inbound events. The stream ends
    /// when the socket closes.
    pub async fn connect(
        base_url: &str,
        peer_id: &PeerId,
    ) -> Result<(Self, mpsc::Receiver<ServerEvent>), SignalingError> {
        let url = format!("{}/ws/{}", base_url.trim_end_matches('/'), peer_id);
        let (socket, _) = connect_async(url.as_str()).await?;
        info!("Signaling connected: {}", url);

        let (mut sender, mut receiver) = socket.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let (in_tx, in_rx) = mpsc::channel::<ServerEvent>(INBOUND_BUFFER);

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                if sender.send(msg).await.is_err() {
                    break;
                }
            }
            let _ = sender.close().await;
        });

        tokio::spawn(async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ServerEvent>(text.as_str()) {
                        Ok(event) => {
                            if in_tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid ServerEvent: {}. Text: {}", e, text.as_str()),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            info!("Signaling socket closed");
        });

        Ok((Self { tx: out_tx }, in_rx))
    }
}

#[async_trait]
impl SignalingSink for WsSignaling {
    async fn emit(&self, event: ClientEvent) -> Result<(), SignalingError> {
        let json = serde_json::to_string(&event)?;
        debug!("WS OUT: {}", json);
        self.tx
            .send(Message::Text(json.into()))
            .map_err(|_| SignalingError::Closed)
    }
}
