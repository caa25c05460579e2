use crate::SignalingService;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use parley_core::{ClientMessage, RelayMessage};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: SignalingService) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<RelayMessage>();

    let peer_id = service.on_connect(tx);
    info!("New WebSocket connection: {}", peer_id);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize relay message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();
        let peer_id = peer_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(client_msg) => {
                            if let Err(e) = service.dispatch(&peer_id, client_msg) {
                                warn!("Rejected frame from {}: {}", peer_id, e);
                            }
                        }
                        Err(e) => warn!("Invalid ClientMessage from {}: {:?}", peer_id, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.on_disconnect(&peer_id);
    info!("WebSocket disconnected: {}", peer_id);
}
