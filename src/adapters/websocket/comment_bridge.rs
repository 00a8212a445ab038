//! Bridge from comment domain events to room broadcasts.
//!
//! The comment subsystem persists a comment, then publishes
//! `comment.created.v1` or `comment.deleted.v1` on the event bus. The bridge
//! turns each into a [`BroadcastEvent`] for the comment's post room.
//!
//! ```text
//! comment.created.v1 ──┐
//!                      ├──▶ CommentBroadcastBridge ──▶ RoomBroadcaster::publish
//! comment.deleted.v1 ──┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::foundation::{CommentId, DomainError, ErrorCode, EventEnvelope, PostId};
use crate::domain::presence::{BroadcastEvent, CommentRecord};
use crate::ports::{EventHandler, EventSubscriber, RoomBroadcaster};

pub const COMMENT_CREATED: &str = "comment.created.v1";
pub const COMMENT_DELETED: &str = "comment.deleted.v1";

/// Event types the bridge subscribes to.
pub const COMMENT_EVENT_TYPES: &[&str] = &[COMMENT_CREATED, COMMENT_DELETED];

/// Payload of `comment.deleted.v1`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDeletedPayload {
    pub post_id: PostId,
    pub comment_id: CommentId,
}

/// Forwards comment events to the post rooms they belong to.
pub struct CommentBroadcastBridge {
    broadcaster: Arc<dyn RoomBroadcaster>,
}

impl CommentBroadcastBridge {
    pub fn new(broadcaster: Arc<dyn RoomBroadcaster>) -> Self {
        Self { broadcaster }
    }

    /// Create as an Arc (for sharing with event subscriber).
    pub fn new_shared(broadcaster: Arc<dyn RoomBroadcaster>) -> Arc<Self> {
        Arc::new(Self::new(broadcaster))
    }

    /// Subscribe this bridge to both comment event types.
    pub fn register(self: &Arc<Self>, subscriber: &impl EventSubscriber) {
        subscriber.subscribe_all(COMMENT_EVENT_TYPES, self.clone());
    }

    /// Returns `Ok(None)` for event types the bridge does not handle.
    fn transform(&self, event: &EventEnvelope) -> Result<Option<BroadcastEvent>, DomainError> {
        match event.event_type.as_str() {
            COMMENT_CREATED => {
                let comment: CommentRecord = event.payload_as().map_err(|e| malformed(event, e))?;
                Ok(Some(BroadcastEvent::comment_created(comment)))
            }
            COMMENT_DELETED => {
                let payload: CommentDeletedPayload =
                    event.payload_as().map_err(|e| malformed(event, e))?;
                Ok(Some(BroadcastEvent::comment_deleted(
                    payload.post_id,
                    payload.comment_id,
                )))
            }
            _ => Ok(None),
        }
    }
}

fn malformed(event: &EventEnvelope, err: serde_json::Error) -> DomainError {
    DomainError::new(
        ErrorCode::MalformedEvent,
        format!("Invalid {} payload: {}", event.event_type, err),
    )
    .with_detail("event_id", event.event_id.to_string())
}

#[async_trait]
impl EventHandler for CommentBroadcastBridge {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let Some(broadcast) = self.transform(&event)? else {
            return Ok(());
        };

        let room_id = broadcast.room_id.clone();
        let kind = broadcast.kind();
        let report = self.broadcaster.publish(&room_id, broadcast).await;

        tracing::debug!(
            event_type = %event.event_type,
            correlation_id = ?event.metadata.correlation_id,
            post_id = %room_id,
            kind = %kind,
            delivered = report.delivered,
            failed = report.failed.len(),
            "Comment event broadcast"
        );

        Ok(())
    }

    fn name(&self) -> &'static str {
        "CommentBroadcastBridge"
    }
}
