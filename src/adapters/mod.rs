//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the presence domain to the outside world:
//! - `presence` - Connection registry, rooms, dispatcher, reconciler
//! - `events` - In-process event bus
//! - `websocket` - Live channel protocol, upgrade handler, comment bridge
//! - `http` - JSON routes and router assembly
//! - `app` - Hub, event bus and router wired into one service

pub mod app;
pub mod events;
pub mod http;
pub mod presence;
pub mod websocket;

pub use app::LiveApp;
pub use events::InMemoryEventBus;
pub use http::build_router;
pub use presence::PresenceHub;
