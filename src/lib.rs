//! Yoshi Land: tile-based platformer physics
//!
//! - `physics`: kinematic bodies stepped against a tile map
//! - `stage`: tile map data and stage files (RON, optionally brotli)
//! - `runtime`: the playable demo built on both

pub mod physics;
pub mod runtime;
pub mod stage;

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
