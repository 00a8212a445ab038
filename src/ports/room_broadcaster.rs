//! RoomBroadcaster port - the publish side of the presence layer.
//!
//! Collaborators that change state visible to a post's viewers (the
//! comment-management subsystem, chiefly) call `publish` with the post as
//! room once the change is durable.
//!
//! ## Contract
//!
//! - Delivery is best-effort: no queuing for absent clients, no replay.
//! - Publishing to a room with no members is a no-op, not an error.
//! - For a single room, events arrive in the order `publish` was called.
//! - A dead or slow member is reported in the returned `DeliveryReport`
//!   and never prevents delivery to the rest of the room.

use async_trait::async_trait;

use crate::domain::foundation::PostId;
use crate::domain::presence::{BroadcastEvent, DeliveryReport};

/// Port for fanning an event out to every current member of a room.
#[async_trait]
pub trait RoomBroadcaster: Send + Sync {
    /// Deliver `event` to the members of `room_id` as resolved right now.
    async fn publish(&self, room_id: &PostId, event: BroadcastEvent) -> DeliveryReport;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn RoomBroadcaster) {}
}
