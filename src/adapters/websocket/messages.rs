//! WebSocket message types for the live presence channel.
//!
//! Defines the protocol between server and connected clients:
//! - Server → Client: connection ack, live counts, comment changes, errors, pongs
//! - Client → Server: room join/leave, pings

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConnectionId, ErrorCode, Timestamp};
use crate::domain::presence::{BroadcastEvent, BroadcastPayload, CommentRecord};

// ============================================
// Server → Client Messages
// ============================================

/// All message types that can be sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// Connection established; sent once right after the upgrade.
    Connected(ConnectedMessage),

    /// Current number of viewers of a post.
    LiveCountUpdate(LiveCountMessage),

    /// A comment was added to a post.
    CommentCreated(CommentCreatedMessage),

    /// A comment was removed from a post.
    CommentDeleted(CommentDeletedMessage),

    /// The last client frame could not be handled.
    Error(ErrorMessage),

    /// Reply to an application-level ping.
    Pong(PongMessage),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub connection_id: String,
    pub timestamp: String,
}

/// `postId` repeats `roomId` for clients that still read the old field.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveCountMessage {
    pub room_id: String,
    pub post_id: String,
    pub viewer_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentCreatedMessage {
    pub comment: CommentRecord,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDeletedMessage {
    pub room_id: String,
    pub comment_id: String,
}

/// Error message sent to client.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
    pub timestamp: String,
}

/// Heartbeat response.
#[derive(Debug, Clone, Serialize)]
pub struct PongMessage {
    pub timestamp: String,
}

impl ServerMessage {
    pub fn connected(connection_id: ConnectionId) -> Self {
        ServerMessage::Connected(ConnectedMessage {
            connection_id: connection_id.to_string(),
            timestamp: Timestamp::now().to_rfc3339(),
        })
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerMessage::Error(ErrorMessage {
            code: code.to_string(),
            message: message.into(),
            timestamp: Timestamp::now().to_rfc3339(),
        })
    }

    pub fn pong() -> Self {
        ServerMessage::Pong(PongMessage {
            timestamp: Timestamp::now().to_rfc3339(),
        })
    }
}

impl From<BroadcastEvent> for ServerMessage {
    fn from(event: BroadcastEvent) -> Self {
        let room_id = event.room_id.as_str().to_string();
        match event.payload {
            BroadcastPayload::CountUpdate { viewer_count } => {
                ServerMessage::LiveCountUpdate(LiveCountMessage {
                    post_id: room_id.clone(),
                    room_id,
                    viewer_count,
                })
            }
            BroadcastPayload::CommentCreated(comment) => {
                ServerMessage::CommentCreated(CommentCreatedMessage { comment: *comment })
            }
            BroadcastPayload::CommentDeleted { comment_id } => {
                ServerMessage::CommentDeleted(CommentDeletedMessage {
                    room_id,
                    comment_id: comment_id.as_str().to_string(),
                })
            }
        }
    }
}

// ============================================
// Client → Server Messages
// ============================================

/// All message types that can be received from client.
///
/// Room ids arrive as raw strings and are validated by the handler so that a
/// bad id yields an `ERROR` frame rather than a parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    #[serde(alias = "JOIN_POST_ROOM")]
    JoinRoom {
        #[serde(rename = "roomId", alias = "postId")]
        room_id: String,
    },

    #[serde(alias = "LEAVE_POST_ROOM")]
    LeaveRoom {
        #[serde(rename = "roomId", alias = "postId")]
        room_id: String,
    },

    /// Heartbeat request.
    Ping,
}
