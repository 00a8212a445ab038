//! Application assembly: presence hub, comment event bus and router.
//!
//! ```text
//! comment subsystem ──publish──▶ InMemoryEventBus ──▶ CommentBroadcastBridge
//!                                                            │
//! browsers ◀──ws── Router ◀── PresenceHub ◀──────────────────┘
//! ```
//!
//! The bus is the comment subsystem's way in: it publishes
//! `comment.created.v1` / `comment.deleted.v1` on [`LiveApp::publisher`]
//! and the bridge fans them out to the post's room.

use std::sync::Arc;

use axum::Router;

use crate::config::AppConfig;
use crate::ports::EventPublisher;

use super::events::InMemoryEventBus;
use super::http::build_router;
use super::presence::PresenceHub;
use super::websocket::{CommentBroadcastBridge, COMMENT_CREATED, COMMENT_DELETED};

/// A fully wired presence service.
pub struct LiveApp {
    hub: PresenceHub,
    event_bus: Arc<InMemoryEventBus>,
    router: Router,
}

impl LiveApp {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_hub(PresenceHub::from_config(&config.presence), config)
    }

    /// Assemble around an existing hub.
    pub fn with_hub(hub: PresenceHub, config: &AppConfig) -> Self {
        let event_bus = Arc::new(InMemoryEventBus::new());
        CommentBroadcastBridge::new_shared(hub.broadcaster()).register(event_bus.as_ref());

        let router = build_router(hub.clone(), &config.server);

        tracing::debug!(
            created_handlers = event_bus.handler_count(COMMENT_CREATED),
            deleted_handlers = event_bus.handler_count(COMMENT_DELETED),
            "Comment bridge subscribed"
        );

        Self {
            hub,
            event_bus,
            router,
        }
    }

    pub fn hub(&self) -> &PresenceHub {
        &self.hub
    }

    pub fn event_bus(&self) -> Arc<InMemoryEventBus> {
        self.event_bus.clone()
    }

    /// Where the comment subsystem publishes its events.
    pub fn publisher(&self) -> Arc<dyn EventPublisher> {
        self.event_bus.clone()
    }

    /// The HTTP + websocket router, ready for `axum::serve`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}
