//! HTTP adapter for presence reads.
//!
//! Endpoints:
//! - `GET /api/health` - liveness check
//! - `GET /api/posts/:post_id/viewers` - current viewer count

mod dto;
mod handlers;
mod routes;

pub use dto::{ErrorResponse, HealthResponse, ViewerCountResponse};
pub use handlers::{get_viewer_count, health, PresenceAppState};
pub use routes::presence_routes;
