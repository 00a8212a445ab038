//! HTTP routes for presence endpoints.

use axum::routing::get;
use axum::Router;

use super::handlers::{get_viewer_count, health, PresenceAppState};

/// Creates the presence router with all JSON routes.
pub fn presence_routes(state: PresenceAppState) -> Router {
    Router::new()
        // GET /api/health
        .route("/api/health", get(health))
        // GET /api/posts/:post_id/viewers
        .route("/api/posts/:post_id/viewers", get(get_viewer_count))
        .with_state(state)
}
