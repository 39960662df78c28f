//! Platformer physics
//!
//! Tile-based kinematic physics for side-scrolling characters:
//! - `KinematicBody`: position, velocity, collision box, ground flag
//! - `PhysicsSystem`: per-body integrator with axis-separated tile collision
//! - `TileQuery`: the map lookup the integrator consumes
//! - `ObjectCollision`: overlap side classification between entities
//! - `FixedTimestep`: accumulator for hosts that want deterministic stepping
//!
//! There is no global state: each system drives one body and borrows the
//! tile map only for the duration of a step.

mod body;
mod config;
mod contact;
mod rect;
mod system;
mod tile;
mod timestep;

pub use body::{BodyError, CollisionAnchor, KinematicBody};
pub use config::{ConfigError, PhysicsConfig};
pub use contact::{CollisionDirection, ObjectCollision};
pub use rect::Rect;
pub use system::{PhysicsSystem, MAX_STEP_SECONDS, TARGET_HZ};
pub use tile::{TileCollisionResult, TileQuery, TileType};
pub use timestep::{FixedTimestep, MAX_STEPS_PER_FRAME};
