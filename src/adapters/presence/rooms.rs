//! Room presence manager: per-post member sets and viewer counts.
//!
//! # Locking
//!
//! ```text
//! rooms: RwLock<HashMap<PostId, Arc<Mutex<RoomSlot>>>>
//!                                   │
//!                                   └── one Mutex per room: the room's
//!                                       serialization point
//! ```
//!
//! The outer map lock is only held long enough to look up or insert a slot;
//! it is never held while waiting on a room. Every mutation of one room's
//! member set (join, leave, the per-room part of leave_all) and every
//! publish to it runs under that room's mutex, so operations on different
//! rooms never block each other. When a room must also touch the registry
//! the order is always room first, registry second.
//!
//! Empty rooms are dropped from the map unless `retain_empty_rooms` is set.
//! A dropped slot is marked `retired`; anyone who fetched it just before
//! removal sees the mark after locking and retries against the live map.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::foundation::{ConnectionId, PostId};
use crate::domain::presence::{MembershipChange, PresenceError, Room};

use super::registry::ConnectionRegistry;

#[derive(Debug)]
pub(crate) struct RoomSlot {
    room: Room,
    retired: bool,
}

/// Exclusive access to one room, held for the duration of a publish.
pub(crate) struct LockedRoom(OwnedMutexGuard<RoomSlot>);

impl LockedRoom {
    pub(crate) fn room(&self) -> &Room {
        &self.0.room
    }
}

/// Tracks, per post, which connections are viewing it.
pub struct RoomPresenceManager {
    registry: Arc<ConnectionRegistry>,
    rooms: RwLock<HashMap<PostId, Arc<Mutex<RoomSlot>>>>,
    retain_empty_rooms: bool,
}

impl RoomPresenceManager {
    pub fn new(registry: Arc<ConnectionRegistry>, retain_empty_rooms: bool) -> Self {
        Self {
            registry,
            rooms: RwLock::new(HashMap::new()),
            retain_empty_rooms,
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Add a connection to a room, creating the room if needed.
    ///
    /// Joining a room the connection is already in leaves the count as it
    /// is and reports `Unchanged`.
    ///
    /// # Errors
    ///
    /// Fails if the connection is unknown or no longer `Open`.
    pub async fn join(
        &self,
        connection_id: ConnectionId,
        post_id: &PostId,
    ) -> Result<MembershipChange, PresenceError> {
        loop {
            let slot = self.slot_or_insert(post_id).await;
            let mut guard = slot.clone().lock_owned().await;
            if guard.retired {
                continue;
            }

            if let Err(e) = self.registry.attach(connection_id, post_id).await {
                self.collect_if_empty(post_id, &slot, &mut guard).await;
                return Err(e);
            }

            let change = guard.room.admit(connection_id);
            tracing::debug!(
                connection_id = %connection_id,
                post_id = %post_id,
                viewer_count = change.viewer_count(),
                changed = change.is_changed(),
                "Joined room"
            );
            return Ok(change);
        }
    }

    /// Remove a connection from a room.
    ///
    /// Leaving a room the connection is not in (or a room that does not
    /// exist) is a no-op and reports `Unchanged`.
    pub async fn leave(&self, connection_id: &ConnectionId, post_id: &PostId) -> MembershipChange {
        loop {
            let Some(slot) = self.slot(post_id).await else {
                return MembershipChange::Unchanged { viewer_count: 0 };
            };
            let mut guard = slot.clone().lock_owned().await;
            if guard.retired {
                continue;
            }

            let change = guard.room.remove(connection_id);
            if change.is_changed() {
                self.registry.detach(connection_id, post_id).await;
                tracing::debug!(
                    connection_id = %connection_id,
                    post_id = %post_id,
                    viewer_count = change.viewer_count(),
                    "Left room"
                );
            }

            self.collect_if_empty(post_id, &slot, &mut guard).await;
            return change;
        }
    }

    /// Remove a connection from every room it belongs to.
    ///
    /// Returns the current count of every room the registry listed, even
    /// one the member had already left without the registry catching up
    /// (a leave cut short between the room and the registry), so each of
    /// those rooms still gets its count update. Rooms are visited one at a
    /// time, so no two room locks are ever held together.
    pub async fn leave_all(&self, connection_id: &ConnectionId) -> Vec<(PostId, usize)> {
        let mut rooms: Vec<PostId> = self
            .registry
            .memberships_of(connection_id)
            .await
            .into_iter()
            .collect();
        rooms.sort();

        let mut updates = Vec::with_capacity(rooms.len());
        for post_id in rooms {
            let change = self.leave(connection_id, &post_id).await;
            if !change.is_changed() {
                // Registry and room disagreed; make the registry agree.
                self.registry.detach(connection_id, &post_id).await;
                tracing::debug!(
                    connection_id = %connection_id,
                    post_id = %post_id,
                    "Membership already gone from room"
                );
            }
            updates.push((post_id, change.viewer_count()));
        }
        updates
    }

    /// Current viewer count of a room; 0 for rooms that do not exist.
    pub async fn count_of(&self, post_id: &PostId) -> usize {
        match self.lock_room(post_id).await {
            Some(locked) => locked.room().viewer_count(),
            None => 0,
        }
    }

    /// Snapshot of a room's members.
    pub async fn members_of(&self, post_id: &PostId) -> Vec<ConnectionId> {
        match self.lock_room(post_id).await {
            Some(locked) => locked.room().members().copied().collect(),
            None => Vec::new(),
        }
    }

    /// Rooms currently held in memory.
    pub async fn active_rooms(&self) -> Vec<PostId> {
        self.rooms.read().await.keys().cloned().collect()
    }

    /// Lock a room for exclusive access. `None` if the room does not exist.
    pub(crate) async fn lock_room(&self, post_id: &PostId) -> Option<LockedRoom> {
        loop {
            let slot = self.slot(post_id).await?;
            let guard = slot.lock_owned().await;
            if !guard.retired {
                return Some(LockedRoom(guard));
            }
        }
    }

    async fn slot(&self, post_id: &PostId) -> Option<Arc<Mutex<RoomSlot>>> {
        self.rooms.read().await.get(post_id).cloned()
    }

    async fn slot_or_insert(&self, post_id: &PostId) -> Arc<Mutex<RoomSlot>> {
        if let Some(slot) = self.slot(post_id).await {
            return slot;
        }

        self.rooms
            .write()
            .await
            .entry(post_id.clone())
            .or_insert_with(|| {
                Arc::new(Mutex::new(RoomSlot {
                    room: Room::new(),
                    retired: false,
                }))
            })
            .clone()
    }

    /// Drop an empty room from the map. Caller holds the room's lock.
    async fn collect_if_empty(
        &self,
        post_id: &PostId,
        slot: &Arc<Mutex<RoomSlot>>,
        guard: &mut OwnedMutexGuard<RoomSlot>,
    ) {
        if self.retain_empty_rooms || !guard.room.is_empty() {
            return;
        }

        let mut rooms = self.rooms.write().await;
        if rooms
            .get(post_id)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
        {
            rooms.remove(post_id);
            guard.retired = true;
            tracing::trace!(post_id = %post_id, "Collected empty room");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::presence::ConnectionStatus;

    fn post(id: &str) -> PostId {
        PostId::new(id).unwrap()
    }

    fn manager() -> RoomPresenceManager {
        RoomPresenceManager::new(Arc::new(ConnectionRegistry::default()), false)
    }

    #[tokio::test]
    async fn join_creates_room_and_counts_member() {
        let rooms = manager();
        let conn = rooms.registry().register().await;

        let change = rooms.join(conn.id, &post("p1")).await.unwrap();

        assert_eq!(change, MembershipChange::Changed { viewer_count: 1 });
        assert_eq!(rooms.count_of(&post("p1")).await, 1);
        assert_eq!(rooms.active_rooms().await, vec![post("p1")]);
    }

    #[tokio::test]
    async fn join_twice_does_not_double_count() {
        let rooms = manager();
        let conn = rooms.registry().register().await;

        rooms.join(conn.id, &post("p1")).await.unwrap();
        let second = rooms.join(conn.id, &post("p1")).await.unwrap();

        assert_eq!(second, MembershipChange::Unchanged { viewer_count: 1 });
        assert_eq!(rooms.count_of(&post("p1")).await, 1);
    }

    #[tokio::test]
    async fn join_records_membership_in_registry() {
        let rooms = manager();
        let conn = rooms.registry().register().await;

        rooms.join(conn.id, &post("p1")).await.unwrap();
        rooms.join(conn.id, &post("p2")).await.unwrap();

        let memberships = rooms.registry().memberships_of(&conn.id).await;
        assert_eq!(memberships.len(), 2);
    }

    #[tokio::test]
    async fn join_unknown_connection_is_rejected_and_leaves_no_room() {
        let rooms = manager();
        let result = rooms.join(ConnectionId::new(), &post("p1")).await;

        assert!(matches!(result, Err(PresenceError::UnknownConnection(_))));
        assert!(rooms.active_rooms().await.is_empty());
    }

    #[tokio::test]
    async fn leave_non_member_does_not_decrement() {
        let rooms = manager();
        let member = rooms.registry().register().await;
        let stranger = rooms.registry().register().await;
        rooms.join(member.id, &post("p1")).await.unwrap();

        let change = rooms.leave(&stranger.id, &post("p1")).await;

        assert_eq!(change, MembershipChange::Unchanged { viewer_count: 1 });
        assert_eq!(rooms.count_of(&post("p1")).await, 1);
    }

    #[tokio::test]
    async fn leave_unknown_room_is_noop() {
        let rooms = manager();
        let change = rooms.leave(&ConnectionId::new(), &post("nowhere")).await;
        assert_eq!(change, MembershipChange::Unchanged { viewer_count: 0 });
    }

    #[tokio::test]
    async fn leave_twice_only_decrements_once() {
        let rooms = manager();
        let x = rooms.registry().register().await;
        let y = rooms.registry().register().await;
        rooms.join(x.id, &post("p1")).await.unwrap();
        rooms.join(y.id, &post("p1")).await.unwrap();

        let first = rooms.leave(&y.id, &post("p1")).await;
        let second = rooms.leave(&y.id, &post("p1")).await;

        assert_eq!(first, MembershipChange::Changed { viewer_count: 1 });
        assert_eq!(second, MembershipChange::Unchanged { viewer_count: 1 });
    }

    #[tokio::test]
    async fn last_leave_collects_room() {
        let rooms = manager();
        let conn = rooms.registry().register().await;
        rooms.join(conn.id, &post("p1")).await.unwrap();

        rooms.leave(&conn.id, &post("p1")).await;

        assert!(rooms.active_rooms().await.is_empty());
        assert_eq!(rooms.count_of(&post("p1")).await, 0);
    }

    #[tokio::test]
    async fn retained_rooms_survive_at_zero() {
        let rooms = RoomPresenceManager::new(Arc::new(ConnectionRegistry::default()), true);
        let conn = rooms.registry().register().await;
        rooms.join(conn.id, &post("p1")).await.unwrap();

        rooms.leave(&conn.id, &post("p1")).await;

        assert_eq!(rooms.active_rooms().await, vec![post("p1")]);
        assert_eq!(rooms.count_of(&post("p1")).await, 0);
    }

    #[tokio::test]
    async fn rejoin_after_collection_starts_fresh_room() {
        let rooms = manager();
        let conn = rooms.registry().register().await;
        rooms.join(conn.id, &post("p1")).await.unwrap();
        rooms.leave(&conn.id, &post("p1")).await;

        let change = rooms.join(conn.id, &post("p1")).await.unwrap();
        assert_eq!(change, MembershipChange::Changed { viewer_count: 1 });
    }

    #[tokio::test]
    async fn leave_all_reports_each_affected_room() {
        let rooms = manager();
        let x = rooms.registry().register().await;
        let y = rooms.registry().register().await;
        rooms.join(x.id, &post("p1")).await.unwrap();
        rooms.join(x.id, &post("p2")).await.unwrap();
        rooms.join(y.id, &post("p1")).await.unwrap();

        let updates = rooms.leave_all(&x.id).await;

        assert_eq!(updates, vec![(post("p1"), 1), (post("p2"), 0)]);
        assert!(rooms.registry().memberships_of(&x.id).await.is_empty());
        assert_eq!(rooms.members_of(&post("p1")).await, vec![y.id]);
    }

    #[tokio::test]
    async fn leave_all_reports_room_the_member_already_left() {
        let rooms = manager();
        let x = rooms.registry().register().await;
        let y = rooms.registry().register().await;
        rooms.join(x.id, &post("p1")).await.unwrap();
        rooms.join(y.id, &post("p1")).await.unwrap();

        // Room updated, registry not yet: an interrupted leave.
        let slot = rooms.slot(&post("p1")).await.unwrap();
        assert!(slot.lock().await.room.remove(&y.id).is_changed());

        let updates = rooms.leave_all(&y.id).await;

        assert_eq!(updates, vec![(post("p1"), 1)]);
        assert!(rooms.registry().memberships_of(&y.id).await.is_empty());
        assert_eq!(rooms.members_of(&post("p1")).await, vec![x.id]);
    }

    #[tokio::test]
    async fn leave_all_without_memberships_is_empty() {
        let rooms = manager();
        let conn = rooms.registry().register().await;
        assert!(rooms.leave_all(&conn.id).await.is_empty());
        assert!(rooms.leave_all(&ConnectionId::new()).await.is_empty());
    }

    #[tokio::test]
    async fn join_rejected_while_closing() {
        let rooms = manager();
        let conn = rooms.registry().register().await;
        rooms.registry().begin_closing(&conn.id).await;

        let result = rooms.join(conn.id, &post("p1")).await;

        assert_eq!(
            result,
            Err(PresenceError::NotOpen {
                connection_id: conn.id,
                status: ConnectionStatus::Closing,
            })
        );
        assert_eq!(rooms.count_of(&post("p1")).await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_joins_are_not_lost() {
        let rooms = Arc::new(manager());
        let mut ids = Vec::new();
        for _ in 0..64 {
            ids.push(rooms.registry().register().await.id);
        }

        let tasks: Vec<_> = ids
            .iter()
            .map(|id| {
                let rooms = rooms.clone();
                let id = *id;
                tokio::spawn(async move { rooms.join(id, &post("hot")).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(rooms.count_of(&post("hot")).await, 64);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn churn_never_loses_or_invents_members() {
        let rooms = Arc::new(manager());
        let mut ids = Vec::new();
        for _ in 0..32 {
            ids.push(rooms.registry().register().await.id);
        }

        // Every connection joins and leaves repeatedly; the odd ones end joined.
        let tasks: Vec<_> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let rooms = rooms.clone();
                let id = *id;
                tokio::spawn(async move {
                    for _ in 0..10 {
                        rooms.join(id, &post("churn")).await.unwrap();
                        rooms.leave(&id, &post("churn")).await;
                    }
                    if i % 2 == 1 {
                        rooms.join(id, &post("churn")).await.unwrap();
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(rooms.count_of(&post("churn")).await, 16);
        for (i, id) in ids.iter().enumerate() {
            let joined = rooms.registry().memberships_of(id).await.contains(&post("churn"));
            assert_eq!(joined, i % 2 == 1);
        }
    }
}
