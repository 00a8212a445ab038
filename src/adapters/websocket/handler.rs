//! WebSocket upgrade handler for the live presence channel.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Register the connection and send `CONNECTED`
//! 2. Forward room broadcasts and direct replies to the client
//! 3. Apply `JOIN_ROOM` / `LEAVE_ROOM` / `PING` frames
//! 4. Reconcile presence exactly once when either side stops

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};

use crate::adapters::presence::{PresenceHub, RegisteredConnection};
use crate::domain::foundation::{ConnectionId, DomainError, ErrorCode, PostId};

use super::messages::{ClientMessage, ServerMessage};

/// Capacity of the per-connection queue for replies that bypass rooms.
const REPLY_BUFFER: usize = 16;

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct LiveState {
    pub hub: PresenceHub,
}

impl LiveState {
    pub fn new(hub: PresenceHub) -> Self {
        Self { hub }
    }
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /api/live`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<LiveState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.hub))
}

/// Runs for the lifetime of one connection.
async fn handle_socket(socket: WebSocket, hub: PresenceHub) {
    let (mut sender, mut receiver) = socket.split();

    let RegisteredConnection {
        id: connection_id,
        events: mut room_rx,
    } = hub.connect().await;

    if let Err(e) = send_message(&mut sender, &ServerMessage::connected(connection_id)).await {
        tracing::debug!(
            connection_id = %connection_id,
            "Failed to send connected message: {}",
            e
        );
        hub.disconnect(&connection_id).await;
        return;
    }

    let (reply_tx, mut reply_rx) = mpsc::channel::<ServerMessage>(REPLY_BUFFER);

    // Forward room broadcasts and direct replies to the client
    let mut send_task = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                Some(event) = room_rx.recv() => ServerMessage::from(event),
                Some(reply) = reply_rx.recv() => reply,
                else => break,
            };
            if let Err(e) = send_message(&mut sender, &msg).await {
                tracing::debug!(
                    connection_id = %connection_id,
                    "Send error, closing connection: {}",
                    e
                );
                break;
            }
        }
    });

    // Handle incoming messages from client. Shutdown is only observed
    // between frames, so a join or leave in progress always completes.
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let recv_hub = hub.clone();
    let mut recv_task = tokio::spawn(async move {
        loop {
            let result = tokio::select! {
                _ = shutdown_rx.changed() => break,
                next = receiver.next() => match next {
                    Some(result) => result,
                    None => break,
                },
            };
            match result {
                Ok(Message::Text(text)) => {
                    let Some(reply) = handle_text(&recv_hub, connection_id, &text).await else {
                        continue;
                    };
                    if reply_tx.send(reply).await.is_err() {
                        break;
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::warn!(
                        connection_id = %connection_id,
                        "Received unsupported binary message"
                    );
                    let reply = ServerMessage::error(
                        ErrorCode::MalformedEvent,
                        "Binary frames are not supported",
                    );
                    if reply_tx.send(reply).await.is_err() {
                        break;
                    }
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Protocol-level keepalive, answered by axum
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(connection_id = %connection_id, "Client sent close frame");
                    break;
                }
                Err(e) => {
                    tracing::debug!(connection_id = %connection_id, "Receive error: {}", e);
                    break;
                }
            }
        }
    });

    let send_ended_first = tokio::select! {
        _ = &mut send_task => true,
        _ = &mut recv_task => false,
    };

    if send_ended_first {
        let _ = shutdown_tx.send(true);
        if let Err(e) = recv_task.await {
            tracing::debug!(connection_id = %connection_id, "Receive task failed: {}", e);
        }
    } else {
        send_task.abort();
    }

    hub.disconnect(&connection_id).await;
}

/// Applies one client text frame and returns the direct reply, if any.
///
/// Count updates caused by a join or leave travel through the room, not
/// through the reply.
pub(crate) async fn handle_text(
    hub: &PresenceHub,
    connection_id: ConnectionId,
    text: &str,
) -> Option<ServerMessage> {
    let msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::warn!(
                connection_id = %connection_id,
                error = %e,
                "Malformed client message"
            );
            return Some(ServerMessage::error(
                ErrorCode::MalformedEvent,
                format!("Malformed message: {}", e),
            ));
        }
    };

    tracing::trace!(connection_id = %connection_id, message = ?msg, "Client message");

    match msg {
        ClientMessage::JoinRoom { room_id } => {
            let post_id = match PostId::new(room_id) {
                Ok(id) => id,
                Err(e) => return Some(invalid_room(connection_id, e.into())),
            };
            match hub.join_room(connection_id, &post_id).await {
                Ok(_) => None,
                Err(e) => {
                    let err = DomainError::from(e);
                    Some(ServerMessage::error(err.code, err.message))
                }
            }
        }
        ClientMessage::LeaveRoom { room_id } => {
            let post_id = match PostId::new(room_id) {
                Ok(id) => id,
                Err(e) => return Some(invalid_room(connection_id, e.into())),
            };
            hub.leave_room(&connection_id, &post_id).await;
            None
        }
        ClientMessage::Ping => Some(ServerMessage::pong()),
    }
}

fn invalid_room(connection_id: ConnectionId, err: DomainError) -> ServerMessage {
    tracing::warn!(
        connection_id = %connection_id,
        error = %err,
        "Invalid room identifier"
    );
    ServerMessage::error(err.code, err.message)
}

/// Send a JSON message over the WebSocket.
async fn send_message(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    sender.send(Message::Text(json)).await
}

/// Create axum router for the WebSocket endpoint.
///
/// ```ignore
/// let app = Router::new()
///     .nest("/api", websocket_router().with_state(LiveState::new(hub)));
/// ```
pub fn websocket_router() -> axum::Router<LiveState> {
    use axum::routing::get;

    axum::Router::new().route("/live", get(ws_handler))
}
