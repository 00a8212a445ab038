//! Ports - Interfaces for external dependencies.
//!
//! Ports define the contracts between the presence layer and its
//! collaborators. Adapters implement these ports.
//!
//! - `RoomBroadcaster` - Fan an event out to the viewers of a post
//! - `EventPublisher` - Publish domain events (comment lifecycle)
//! - `EventSubscriber` / `EventHandler` - React to published domain events

mod event_publisher;
mod event_subscriber;
mod room_broadcaster;

pub use event_publisher::EventPublisher;
pub use event_subscriber::{EventBus, EventHandler, EventSubscriber};
pub use room_broadcaster::RoomBroadcaster;
