//! Presence domain - who is viewing which post, and what they are told.
//!
//! Pure value types only; the concurrent components that own this state
//! live in `adapters::presence`.

mod comment;
mod connection;
mod delivery;
mod errors;
mod event;
mod room;

pub use comment::{CommentAuthor, CommentRecord};
pub use connection::ConnectionStatus;
pub use delivery::{DeliveryFailure, DeliveryReport};
pub use errors::PresenceError;
pub use event::{BroadcastEvent, BroadcastKind, BroadcastPayload};
pub use room::{MembershipChange, Room};
