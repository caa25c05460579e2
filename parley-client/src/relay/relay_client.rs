use crate::signal_sink::SignalSink;
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parley_core::{ClientMessage, PeerId, RelayMessage, SignalPayload};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, warn};

/// WebSocket connection to the signaling relay.
///
/// Outbound frames are queued and written by a background task; inbound
/// frames are decoded and handed out on the receiver returned by
/// [`connect`](Self::connect). Clones share the same connection.
#[derive(Clone)]
pub struct RelayClient {
    outbound: mpsc::UnboundedSender<ClientMessage>,
}

impl RelayClient {
    pub async fn connect(
        url: &str,
    ) -> anyhow::Result<(Self, mpsc::UnboundedReceiver<RelayMessage>)> {
        let (ws_stream, _) = connect_async(url)
            .await
            .with_context(|| format!("Failed to connect to relay at {}", url))?;
        let (mut ws_write, mut ws_read) = ws_stream.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientMessage>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<RelayMessage>();

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let text = match serde_json::to_string(&msg) {
                    Ok(text) => text,
                    Err(e) => {
                        error!("Failed to encode relay frame: {}", e);
                        continue;
                    }
                };
                if let Err(e) = ws_write.send(Message::Text(text.into())).await {
                    warn!("Relay write failed: {}", e);
                    break;
                }
            }
            let _ = ws_write.close().await;
        });

        tokio::spawn(async move {
            while let Some(frame) = ws_read.next().await {
                match frame {
                    Ok(Message::Text(text)) => match serde_json::from_str::<RelayMessage>(&text) {
                        Ok(msg) => {
                            if in_tx.send(msg).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Undecodable relay frame: {}", e),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Relay read failed: {}", e);
                        break;
                    }
                }
            }
            debug!("Relay connection closed");
        });

        Ok((Self { outbound: out_tx }, in_rx))
    }

    pub fn send(&self, msg: ClientMessage) -> anyhow::Result<()> {
        self.outbound
            .send(msg)
            .map_err(|_| anyhow!("relay connection is closed"))
    }

    pub fn join(&self, room: &str, display_name: Option<String>) -> anyhow::Result<()> {
        self.send(ClientMessage::Join {
            room: room.to_owned(),
            display_name,
        })
    }
}

#[async_trait]
impl SignalSink for RelayClient {
    async fn send_signal(&self, target: PeerId, signal: SignalPayload) {
        let msg = ClientMessage::Signal {
            target: target.clone(),
            target_display_name: None,
            signal,
        };
        if self.send(msg).is_err() {
            warn!("Relay is gone, dropping signal to {}", target);
        }
    }
}
