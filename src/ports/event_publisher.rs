//! EventPublisher port - Interface for publishing domain events.
//!
//! The comment-management subsystem publishes `comment.created.v1` and
//! `comment.deleted.v1` through this port once the change is durable.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Port for publishing domain events.
///
/// Handler failures are propagated to the caller.
///
/// # Example
///
/// ```ignore
/// let event = EventEnvelope::new("comment.created.v1", comment_id, "Comment", payload);
/// publisher.publish(event).await?;
/// ```
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a single event.
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Publish multiple events in order, stopping at the first failure.
    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError>;
}
