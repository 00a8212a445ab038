//! Presence hub: the four presence components wired together.
//!
//! Transports talk to the hub; the hub turns membership changes into count
//! broadcasts:
//!
//! - join that changed the room → `LIVE_COUNT_UPDATE` to the whole room
//! - join that was already a member → current count to the joiner only
//! - leave that changed the room → `LIVE_COUNT_UPDATE` to the remaining members
//! - leave that was a no-op → nothing
//! - disconnect → reconciliation, one update per room the connection was in

use std::sync::Arc;

use crate::config::PresenceConfig;
use crate::domain::foundation::{ConnectionId, PostId};
use crate::domain::presence::{BroadcastEvent, DeliveryReport, MembershipChange, PresenceError};
use crate::ports::RoomBroadcaster;

use super::dispatcher::BroadcastDispatcher;
use super::reconciler::DisconnectReconciler;
use super::registry::{ConnectionRegistry, RegisteredConnection};
use super::rooms::RoomPresenceManager;

#[derive(Clone)]
pub struct PresenceHub {
    registry: Arc<ConnectionRegistry>,
    rooms: Arc<RoomPresenceManager>,
    dispatcher: Arc<BroadcastDispatcher>,
    reconciler: Arc<DisconnectReconciler>,
}

impl PresenceHub {
    pub fn new(outbound_capacity: usize, retain_empty_rooms: bool) -> Self {
        let registry = Arc::new(ConnectionRegistry::new(outbound_capacity));
        let rooms = Arc::new(RoomPresenceManager::new(
            registry.clone(),
            retain_empty_rooms,
        ));
        let dispatcher = Arc::new(BroadcastDispatcher::new(rooms.clone()));
        let reconciler = Arc::new(DisconnectReconciler::new(
            registry.clone(),
            rooms.clone(),
            dispatcher.clone(),
        ));

        Self {
            registry,
            rooms,
            dispatcher,
            reconciler,
        }
    }

    pub fn from_config(config: &PresenceConfig) -> Self {
        Self::new(config.outbound_buffer, config.retain_empty_rooms)
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn rooms(&self) -> &Arc<RoomPresenceManager> {
        &self.rooms
    }

    /// The publish side, for collaborators that only need to broadcast.
    pub fn broadcaster(&self) -> Arc<dyn RoomBroadcaster> {
        self.dispatcher.clone()
    }

    /// Register a newly opened client channel.
    pub async fn connect(&self) -> RegisteredConnection {
        self.registry.register().await
    }

    /// Join a post's room and announce the count.
    ///
    /// # Errors
    ///
    /// Fails if the connection is unknown or already closing.
    pub async fn join_room(
        &self,
        connection_id: ConnectionId,
        post_id: &PostId,
    ) -> Result<MembershipChange, PresenceError> {
        let change = self.rooms.join(connection_id, post_id).await?;
        let update = BroadcastEvent::count_update(post_id.clone(), change.viewer_count());

        if change.is_changed() {
            self.dispatcher.publish(post_id, update).await;
        } else if let Err(failure) = self.dispatcher.send_to(&connection_id, update).await {
            tracing::debug!(
                connection_id = %connection_id,
                post_id = %post_id,
                ?failure,
                "Could not resend count on rejoin"
            );
        }

        Ok(change)
    }

    /// Leave a post's room; announces the new count only if membership changed.
    pub async fn leave_room(&self, connection_id: &ConnectionId, post_id: &PostId) -> MembershipChange {
        let change = self.rooms.leave(connection_id, post_id).await;
        if change.is_changed() {
            self.dispatcher
                .publish(
                    post_id,
                    BroadcastEvent::count_update(post_id.clone(), change.viewer_count()),
                )
                .await;
        }
        change
    }

    /// Run disconnect reconciliation for a terminated connection.
    pub async fn disconnect(&self, connection_id: &ConnectionId) -> Vec<(PostId, usize)> {
        self.reconciler.reconcile(connection_id).await
    }

    /// Fan an event out to a room.
    pub async fn publish(&self, room_id: &PostId, event: BroadcastEvent) -> DeliveryReport {
        self.dispatcher.publish(room_id, event).await
    }

    pub async fn viewer_count(&self, post_id: &PostId) -> usize {
        self.rooms.count_of(post_id).await
    }
}

impl Default for PresenceHub {
    fn default() -> Self {
        Self::from_config(&PresenceConfig::default())
    }
}
