//! HTTP adapters - REST API and router assembly.

pub mod presence;
mod router;

pub use presence::{presence_routes, PresenceAppState};
pub use router::{build_router, cors_layer};
