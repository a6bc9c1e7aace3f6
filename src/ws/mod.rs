pub mod handlers;
pub mod host;
pub mod player;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::{view_for, AppState};
use crate::types::GameSession;
use handlers::Conn;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// One connection = one participant. The connection is unbound until a
/// create or join message succeeds; from then on it receives every session
/// snapshot and re-renders from it.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut conn = Conn::new();
    let mut snapshots: Option<broadcast::Receiver<GameSession>> = None;

    loop {
        tokio::select! {
            snapshot = async {
                match &mut snapshots {
                    Some(rx) => Some(rx.recv().await),
                    // Unbound connection: wait for a join
                    None => std::future::pending().await,
                }
            } => {
                match snapshot {
                    Some(Ok(session)) => {
                        conn.observe_snapshot(&session);
                        let view = conn
                            .name
                            .as_deref()
                            .map(|name| view_for(&session, name))
                            .unwrap_or(crate::protocol::ParticipantView::Unknown);
                        if send_msg(&mut sender, &ServerMessage::Session { session, view })
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Some(Err(RecvError::Lagged(skipped))) => {
                        // Snapshots are full documents, so skipping stale
                        // ones keeps the view monotonic
                        tracing::warn!("Snapshot subscriber lagged, skipped {}", skipped);
                    }
                    Some(Err(RecvError::Closed)) => {
                        tracing::info!("Game {:?} was deleted, unbinding connection", conn.code);
                        let _ = send_msg(
                            &mut sender,
                            &ServerMessage::Error {
                                code: "GAME_CLOSED".to_string(),
                                msg: "The game was closed by the host".to_string(),
                            },
                        )
                        .await;
                        conn = Conn::new();
                        snapshots = None;
                    }
                    None => unreachable!("pending future never resolves"),
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                let response =
                                    handlers::handle_message(client_msg, &mut conn, &state).await;

                                // A successful create/join binds the
                                // connection; open its snapshot feed
                                if snapshots.is_none() {
                                    if let Some(code) = &conn.code {
                                        snapshots = state.subscribe(code).await;
                                    }
                                }

                                if let Some(msg) = response {
                                    if send_msg(&mut sender, &msg).await.is_err() {
                                        break;
                                    }
                                }
                            }
                            Err(e) => {
                                tracing::error!("Failed to parse client message: {}", e);
                                let err = ServerMessage::Error {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("Invalid message format: {}", e),
                                };
                                let _ = send_msg(&mut sender, &err).await;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => break,
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    // Dropping the socket drops the subscription; a host connection also
    // drops its presence key, which may trigger session cleanup.
    if let (Some(code), Some(host_uid)) = (&conn.code, &conn.host_uid) {
        state.presence.remove_presence(code, host_uid).await;
    }
    tracing::info!("WebSocket connection closed ({:?})", conn.name);
}

async fn send_msg(
    sender: &mut (impl SinkExt<Message> + Unpin),
    msg: &ServerMessage,
) -> Result<(), ()> {
    let json = serde_json::to_string(msg).map_err(|_| ())?;
    sender.send(Message::Text(json.into())).await.map_err(|_| ())
}
