//! Domain layer containing the presence model and shared primitives.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, events)
//! - `presence` - Connections, rooms and broadcast events

pub mod foundation;
pub mod presence;
