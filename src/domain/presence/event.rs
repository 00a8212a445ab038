//! Broadcast events fanned out to room members.

use crate::domain::foundation::{CommentId, PostId};

use super::CommentRecord;

/// The three kinds of event a room can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BroadcastKind {
    CountUpdate,
    CommentCreated,
    CommentDeleted,
}

impl BroadcastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BroadcastKind::CountUpdate => "count_update",
            BroadcastKind::CommentCreated => "comment_created",
            BroadcastKind::CommentDeleted => "comment_deleted",
        }
    }
}

impl std::fmt::Display for BroadcastKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastPayload {
    CountUpdate { viewer_count: usize },
    CommentCreated(Box<CommentRecord>),
    CommentDeleted { comment_id: CommentId },
}

/// Transient value object delivered to every member of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastEvent {
    pub room_id: PostId,
    pub payload: BroadcastPayload,
}

impl BroadcastEvent {
    pub fn count_update(room_id: PostId, viewer_count: usize) -> Self {
        Self {
            room_id,
            payload: BroadcastPayload::CountUpdate { viewer_count },
        }
    }

    /// A created comment is broadcast to the room of the post it belongs to.
    pub fn comment_created(comment: CommentRecord) -> Self {
        Self {
            room_id: comment.post.clone(),
            payload: BroadcastPayload::CommentCreated(Box::new(comment)),
        }
    }

    pub fn comment_deleted(room_id: PostId, comment_id: CommentId) -> Self {
        Self {
            room_id,
            payload: BroadcastPayload::CommentDeleted { comment_id },
        }
    }

    pub fn kind(&self) -> BroadcastKind {
        match self.payload {
            BroadcastPayload::CountUpdate { .. } => BroadcastKind::CountUpdate,
            BroadcastPayload::CommentCreated(_) => BroadcastKind::CommentCreated,
            BroadcastPayload::CommentDeleted { .. } => BroadcastKind::CommentDeleted,
        }
    }

    /// Restamps a count update with the count observed at delivery time.
    ///
    /// Other kinds are returned untouched.
    pub fn with_current_count(mut self, viewer_count: usize) -> Self {
        if let BroadcastPayload::CountUpdate { viewer_count: stale } = &mut self.payload {
            *stale = viewer_count;
        }
        self
    }
}
