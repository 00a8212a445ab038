//! WebSocket adapters for the live presence channel.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                 InMemoryEventBus                              │
//! │   comment.created.v1 / comment.deleted.v1                     │
//! └───────────────────────────────────────────────────────────────┘
//!                               │ subscribes
//!                               ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │                 CommentBroadcastBridge                        │
//! └───────────────────────────────────────────────────────────────┘
//!                               │ RoomBroadcaster::publish
//!                               ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │                 PresenceHub                                   │
//! │   Room: post-a        Room: post-b                            │
//! │   ├── conn-1          └── conn-3                              │
//! │   └── conn-2                                                  │
//! └───────────────────────────────────────────────────────────────┘
//!                               │ per-connection queue
//!                               ▼
//!                     ws_handler send task → client
//! ```
//!
//! # Components
//!
//! - [`messages`] - wire protocol types
//! - [`handler`] - axum WebSocket upgrade handler
//! - [`comment_bridge`] - comment events → room broadcasts

pub mod comment_bridge;
pub mod handler;
pub mod messages;

pub use comment_bridge::{
    CommentBroadcastBridge, CommentDeletedPayload, COMMENT_CREATED, COMMENT_DELETED,
    COMMENT_EVENT_TYPES,
};
pub use handler::{websocket_router, ws_handler, LiveState};
pub use messages::{ClientMessage, ServerMessage};
