//! Connection registry: the set of open connections and the rooms each joined.
//!
//! The registry exclusively owns connection records. Rooms refer to
//! connections by id only; the outbound sender lives here, so a room
//! resolves its members through the registry at publish time.

use std::collections::{HashMap, HashSet};

use tokio::sync::{mpsc, RwLock};

use crate::domain::foundation::{ConnectionId, PostId, StateMachine};
use crate::domain::presence::{BroadcastEvent, ConnectionStatus, PresenceError};

/// Sending half of a connection's outbound queue.
pub type OutboundSender = mpsc::Sender<BroadcastEvent>;

/// Handle returned to the transport when a connection registers.
#[derive(Debug)]
pub struct RegisteredConnection {
    pub id: ConnectionId,
    /// Events addressed to this connection. Drain it into the socket.
    pub events: mpsc::Receiver<BroadcastEvent>,
}

#[derive(Debug)]
struct ConnectionEntry {
    status: ConnectionStatus,
    rooms: HashSet<PostId>,
    outbound: OutboundSender,
}

/// Owns every live connection record.
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, ConnectionEntry>>,
    outbound_capacity: usize,
}

impl ConnectionRegistry {
    /// Create a registry whose connections buffer up to `outbound_capacity`
    /// undelivered events each before further events are dropped for them.
    pub fn new(outbound_capacity: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            outbound_capacity: outbound_capacity.max(1),
        }
    }

    /// Allocate a new `Open` connection with no memberships.
    pub async fn register(&self) -> RegisteredConnection {
        let (outbound, events) = mpsc::channel(self.outbound_capacity);
        let id = ConnectionId::new();

        self.connections.write().await.insert(
            id,
            ConnectionEntry {
                status: ConnectionStatus::Open,
                rooms: HashSet::new(),
                outbound,
            },
        );

        tracing::debug!(connection_id = %id, "Connection registered");
        RegisteredConnection { id, events }
    }

    /// Remove a connection record.
    ///
    /// Unknown ids are a no-op. A connection that still belongs to rooms is
    /// left in place: it has to go through disconnect reconciliation first,
    /// otherwise its rooms would keep counting a member that no longer exists.
    ///
    /// Returns `true` if a record was removed.
    pub async fn deregister(&self, connection_id: &ConnectionId) -> bool {
        let mut connections = self.connections.write().await;

        let Some(entry) = connections.get(connection_id) else {
            return false;
        };

        if !entry.rooms.is_empty() {
            tracing::warn!(
                connection_id = %connection_id,
                rooms = entry.rooms.len(),
                "Refusing to deregister connection that still has room memberships"
            );
            return false;
        }

        let closed = match entry.status {
            ConnectionStatus::Open => ConnectionStatus::Open
                .transition_to(ConnectionStatus::Closing)
                .and_then(|s| s.transition_to(ConnectionStatus::Closed)),
            other => other.transition_to(ConnectionStatus::Closed),
        };
        if let Err(e) = closed {
            tracing::debug!(connection_id = %connection_id, "Deregister skipped: {}", e);
            return false;
        }

        connections.remove(connection_id);
        tracing::debug!(connection_id = %connection_id, "Connection deregistered");
        true
    }

    /// Snapshot of the rooms a connection has joined. Empty if unknown.
    pub async fn memberships_of(&self, connection_id: &ConnectionId) -> HashSet<PostId> {
        self.connections
            .read()
            .await
            .get(connection_id)
            .map(|entry| entry.rooms.clone())
            .unwrap_or_default()
    }

    /// Current lifecycle status, or `None` once the record is gone.
    pub async fn status_of(&self, connection_id: &ConnectionId) -> Option<ConnectionStatus> {
        self.connections
            .read()
            .await
            .get(connection_id)
            .map(|entry| entry.status)
    }

    /// Number of registered connections (any status).
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Record that a connection joined a room.
    ///
    /// Refused unless the connection is `Open`; this check and
    /// `begin_closing` are serialized by the registry lock, so a join
    /// either lands before reconciliation snapshots the memberships or is
    /// rejected.
    pub(crate) async fn attach(
        &self,
        connection_id: ConnectionId,
        post_id: &PostId,
    ) -> Result<(), PresenceError> {
        let mut connections = self.connections.write().await;
        let entry = connections
            .get_mut(&connection_id)
            .ok_or(PresenceError::UnknownConnection(connection_id))?;

        if !entry.status.accepts_membership_changes() {
            return Err(PresenceError::NotOpen {
                connection_id,
                status: entry.status,
            });
        }

        entry.rooms.insert(post_id.clone());
        Ok(())
    }

    /// Forget that a connection belongs to a room. No-op if unknown.
    pub(crate) async fn detach(&self, connection_id: &ConnectionId, post_id: &PostId) {
        if let Some(entry) = self.connections.write().await.get_mut(connection_id) {
            entry.rooms.remove(post_id);
        }
    }

    /// Move an `Open` connection to `Closing`.
    ///
    /// Returns `false` for unknown connections and for connections already
    /// closing, which makes reconciliation run at most once per connection.
    pub(crate) async fn begin_closing(&self, connection_id: &ConnectionId) -> bool {
        let mut connections = self.connections.write().await;
        let Some(entry) = connections.get_mut(connection_id) else {
            return false;
        };

        match entry.status.transition_to(ConnectionStatus::Closing) {
            Ok(next) => {
                entry.status = next;
                true
            }
            Err(_) => false,
        }
    }

    /// Resolve outbound senders for a set of members in one lock acquisition.
    pub(crate) async fn outbound_for<'a>(
        &self,
        members: impl IntoIterator<Item = &'a ConnectionId>,
    ) -> Vec<(ConnectionId, Option<OutboundSender>)> {
        let connections = self.connections.read().await;
        members
            .into_iter()
            .map(|id| (*id, connections.get(id).map(|entry| entry.outbound.clone())))
            .collect()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(64)
    }
}
