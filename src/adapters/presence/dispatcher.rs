//! Broadcast dispatcher: fans an event out to the members of one room.
//!
//! Delivery holds the room's lock, which is what orders events per room:
//! two publishes to the same room are delivered in the order they acquired
//! it. Each member gets the event through a non-blocking `try_send` onto its
//! outbound queue, so a slow or dead member costs the room nothing beyond a
//! failed enqueue.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::error::TrySendError;

use crate::domain::foundation::{ConnectionId, PostId};
use crate::domain::presence::{BroadcastEvent, DeliveryFailure, DeliveryReport};
use crate::ports::RoomBroadcaster;

use super::registry::OutboundSender;
use super::rooms::RoomPresenceManager;

/// Delivers broadcast events to room members.
pub struct BroadcastDispatcher {
    rooms: Arc<RoomPresenceManager>,
}

impl BroadcastDispatcher {
    pub fn new(rooms: Arc<RoomPresenceManager>) -> Self {
        Self { rooms }
    }

    /// Deliver `event` to every current member of `room_id`.
    ///
    /// Membership is resolved under the room's lock at the moment of the
    /// call. The event is re-addressed to `room_id`, and a count update is
    /// restamped with the member count seen under that lock, so the last
    /// count a client receives always matches the room.
    ///
    /// Publishing to a room that does not exist or has no members is a
    /// no-op and returns an empty report.
    pub async fn publish(&self, room_id: &PostId, event: BroadcastEvent) -> DeliveryReport {
        let Some(locked) = self.rooms.lock_room(room_id).await else {
            tracing::trace!(post_id = %room_id, kind = %event.kind(), "Publish to absent room");
            return DeliveryReport::empty();
        };

        let room = locked.room();
        if room.is_empty() {
            return DeliveryReport::empty();
        }

        let mut event = event.with_current_count(room.viewer_count());
        event.room_id = room_id.clone();

        let targets = self.rooms.registry().outbound_for(room.members()).await;
        let mut report = DeliveryReport::empty();
        for (connection_id, outbound) in targets {
            let outcome = match outbound {
                Some(tx) => deliver(&tx, event.clone()),
                None => Err(DeliveryFailure::Unknown),
            };
            match outcome {
                Ok(()) => report.record_success(),
                Err(failure) => report.record_failure(connection_id, failure),
            }
        }
        drop(locked);

        for (connection_id, failure) in &report.failed {
            tracing::warn!(
                connection_id = %connection_id,
                post_id = %room_id,
                kind = %event.kind(),
                ?failure,
                "Broadcast not delivered"
            );
        }
        tracing::trace!(
            post_id = %room_id,
            kind = %event.kind(),
            delivered = report.delivered,
            "Broadcast published"
        );

        report
    }

    /// Deliver an event to a single connection, outside any room.
    pub async fn send_to(
        &self,
        connection_id: &ConnectionId,
        event: BroadcastEvent,
    ) -> Result<(), DeliveryFailure> {
        let resolved = self
            .rooms
            .registry()
            .outbound_for([connection_id])
            .await
            .pop()
            .and_then(|(_, outbound)| outbound);

        match resolved {
            Some(tx) => deliver(&tx, event),
            None => Err(DeliveryFailure::Unknown),
        }
    }
}

#[async_trait]
impl RoomBroadcaster for BroadcastDispatcher {
    async fn publish(&self, room_id: &PostId, event: BroadcastEvent) -> DeliveryReport {
        BroadcastDispatcher::publish(self, room_id, event).await
    }
}

fn deliver(tx: &OutboundSender, event: BroadcastEvent) -> Result<(), DeliveryFailure> {
    tx.try_send(event).map_err(|e| match e {
        TrySendError::Full(_) => DeliveryFailure::Lagging,
        TrySendError::Closed(_) => DeliveryFailure::Disconnected,
    })
}
