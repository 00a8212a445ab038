//! Room membership: the set of connections viewing one post.

use std::collections::HashSet;

use crate::domain::foundation::ConnectionId;

/// Result of a membership mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    /// The member set changed; carries the new viewer count.
    Changed { viewer_count: usize },
    /// The call was a no-op; carries the (unchanged) viewer count.
    Unchanged { viewer_count: usize },
}

impl MembershipChange {
    pub fn viewer_count(&self) -> usize {
        match self {
            MembershipChange::Changed { viewer_count }
            | MembershipChange::Unchanged { viewer_count } => *viewer_count,
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, MembershipChange::Changed { .. })
    }
}

/// Broadcast scope for one post.
///
/// The viewer count is always `members.len()`; there is no separate counter
/// to drift out of sync.
/// Rooms are keyed by post id in the room manager; the room itself only
/// holds its members.
#[derive(Debug, Clone, Default)]
pub struct Room {
    members: HashSet<ConnectionId>,
}

impl Room {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member. Re-admitting an existing member is a no-op.
    pub fn admit(&mut self, connection_id: ConnectionId) -> MembershipChange {
        if self.members.insert(connection_id) {
            MembershipChange::Changed {
                viewer_count: self.viewer_count(),
            }
        } else {
            MembershipChange::Unchanged {
                viewer_count: self.viewer_count(),
            }
        }
    }

    /// Removes a member. Removing a non-member is a no-op.
    pub fn remove(&mut self, connection_id: &ConnectionId) -> MembershipChange {
        if self.members.remove(connection_id) {
            MembershipChange::Changed {
                viewer_count: self.viewer_count(),
            }
        } else {
            MembershipChange::Unchanged {
                viewer_count: self.viewer_count(),
            }
        }
    }

    pub fn viewer_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> impl Iterator<Item = &ConnectionId> {
        self.members.iter()
    }
}
