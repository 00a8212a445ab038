//! In-process presence layer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐  membership   ┌──────────────────────┐
//! │  ConnectionRegistry  │◄──────────────│  RoomPresenceManager │
//! │  conn → rooms, queue │  bookkeeping  │  post → member set   │
//! └──────────────────────┘               └──────────────────────┘
//!            ▲                                   ▲        ▲
//!            │ deregister                        │        │ resolve members
//!            │                       leave_all   │        │
//! ┌──────────────────────┐──────────────────────┘  ┌──────────────────────┐
//! │ DisconnectReconciler │─────────────────────────►│ BroadcastDispatcher  │
//! └──────────────────────┘   COUNT_UPDATE per room  └──────────────────────┘
//! ```
//!
//! [`PresenceHub`] owns one of each and is what transports use.
//!
//! # Components
//!
//! - [`registry`] - Open connections and their joined rooms
//! - [`rooms`] - Per-post member sets, serialized per room
//! - [`dispatcher`] - Fan-out of events to a room's members
//! - [`reconciler`] - Cleanup when a connection terminates
//! - [`hub`] - Composition plus count-broadcast policy

pub mod dispatcher;
pub mod hub;
pub mod reconciler;
pub mod registry;
pub mod rooms;

pub use dispatcher::BroadcastDispatcher;
pub use hub::PresenceHub;
pub use reconciler::DisconnectReconciler;
pub use registry::{ConnectionRegistry, OutboundSender, RegisteredConnection};
pub use rooms::RoomPresenceManager;
