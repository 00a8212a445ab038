//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that form the
//! vocabulary of the Flux blog's real-time layer.

mod errors;
mod events;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{EventEnvelope, EventId, EventMetadata};
pub use ids::{CommentId, ConnectionId, PostId, UserId, MAX_EXTERNAL_ID_LEN};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
