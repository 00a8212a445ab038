//! Disconnect reconciliation.
//!
//! Runs once per connection termination, whichever collaborator notices it
//! first (transport close, send failure, explicit client disconnect):
//!
//! 1. `Open → Closing` in the registry; later callers find it not `Open`
//!    and return immediately
//! 2. `leave_all` unwinds every membership
//! 3. one count update per affected room
//! 4. `Closing → Closed`, record removed

use std::sync::Arc;

use crate::domain::foundation::{ConnectionId, PostId};
use crate::domain::presence::BroadcastEvent;

use super::dispatcher::BroadcastDispatcher;
use super::registry::ConnectionRegistry;
use super::rooms::RoomPresenceManager;

pub struct DisconnectReconciler {
    registry: Arc<ConnectionRegistry>,
    rooms: Arc<RoomPresenceManager>,
    dispatcher: Arc<BroadcastDispatcher>,
}

impl DisconnectReconciler {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        rooms: Arc<RoomPresenceManager>,
        dispatcher: Arc<BroadcastDispatcher>,
    ) -> Self {
        Self {
            registry,
            rooms,
            dispatcher,
        }
    }

    /// Remove a terminated connection from all rooms and announce new counts.
    ///
    /// Returns the `(room, new count)` pairs that were broadcast. Calling it
    /// again for the same connection, or for an unknown one, returns an
    /// empty list and broadcasts nothing.
    pub async fn reconcile(&self, connection_id: &ConnectionId) -> Vec<(PostId, usize)> {
        if !self.registry.begin_closing(connection_id).await {
            tracing::trace!(
                connection_id = %connection_id,
                "Reconciliation skipped: connection unknown or already closing"
            );
            return Vec::new();
        }

        let updates = self.rooms.leave_all(connection_id).await;
        for (post_id, viewer_count) in &updates {
            self.dispatcher
                .publish(
                    post_id,
                    BroadcastEvent::count_update(post_id.clone(), *viewer_count),
                )
                .await;
        }

        self.registry.deregister(connection_id).await;

        tracing::debug!(
            connection_id = %connection_id,
            rooms = updates.len(),
            "Connection reconciled"
        );
        updates
    }
}
