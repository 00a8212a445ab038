//! Flux Blog - real-time presence and broadcast layer
//!
//! Tracks which connected readers are viewing which blog post, keeps live
//! viewer counts, and fans comment changes out to everyone viewing the post.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
