//! Physics System
//!
//! Semi-fixed-step kinematic integrator with axis-separated collision
//! resolution against a tile grid. One system drives exactly one body.
//!
//! Each step runs, in order:
//! 1. Ground probe (thin strip under the collision box), pulling a hovering
//!    body flush onto its footing
//! 2. Horizontal friction
//! 3. Gravity, or zeroing of residual downward speed while grounded
//! 4. Horizontal sweep: blocking tiles stop the body, everything else is passable
//! 5. Vertical sweep: world top clamp, penetrable lookahead, one-way
//!    platforms, landings and head bonks
//!
//! Horizontal is resolved before vertical. Corner tunnelling on diagonals
//! is a known limitation of resolving the axes separately.

use macroquad::math::Vec2;
use super::body::KinematicBody;
use super::config::{ConfigError, PhysicsConfig};
use super::rect::Rect;
use super::tile::{TileCollisionResult, TileQuery};

/// Rate the tuning constants were authored for
pub const TARGET_HZ: f32 = 60.0;

/// Longest frame a single step will integrate (seconds)
pub const MAX_STEP_SECONDS: f32 = 0.1;

pub struct PhysicsSystem {
    body: KinematicBody,
    config: PhysicsConfig,
}

/// Valid, clamped frame time, or None for a no-op step
fn sanitize_dt(dt: f32) -> Option<f32> {
    if !dt.is_finite() || dt <= 0.0 {
        return None;
    }
    Some(dt.min(MAX_STEP_SECONDS))
}

impl PhysicsSystem {
    pub fn new(body: KinematicBody, config: PhysicsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { body, config })
    }

    pub fn with_default_config(body: KinematicBody) -> Self {
        Self { body, config: PhysicsConfig::default() }
    }

    pub fn body(&self) -> &KinematicBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut KinematicBody {
        &mut self.body
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn is_on_ground(&self) -> bool {
        self.body.is_on_ground()
    }

    pub fn set_has_gravity(&mut self, has_gravity: bool) {
        self.body.set_has_gravity(has_gravity);
    }

    pub fn set_has_collisions(&mut self, has_collisions: bool) {
        self.body.set_has_collisions(has_collisions);
    }

    /// Advance the body by one frame. Returns whether it ended grounded.
    ///
    /// Non-positive or non-finite `dt` leaves the body untouched; very long
    /// frames are clamped to `MAX_STEP_SECONDS`.
    pub fn step<Q: TileQuery + ?Sized>(&mut self, tiles: &Q, dt: f32) -> bool {
        let Some(dt) = sanitize_dt(dt) else {
            return self.body.is_on_ground();
        };
        let scale = dt * TARGET_HZ;
        let (previous_position, previous_ground) = (self.body.position, self.body.is_on_ground());

        if !self.body.has_collisions() {
            self.step_ghost(scale);
        } else {
            self.body.position = self.settle(tiles, self.body.position);

            self.apply_friction(scale);
            self.apply_gravity(scale);

            let position = self.resolve_horizontal(tiles, self.body.position, scale);
            let position = self.resolve_vertical(tiles, position, scale);
            self.body.position = position;
        }

        if !self.body.is_finite() {
            log::warn!(
                "physics step produced non-finite state (pos {:?}, vel {:?}); reverting",
                self.body.position,
                self.body.velocity
            );
            self.body.position = if previous_position.is_finite() {
                previous_position
            } else {
                Vec2::ZERO
            };
            self.body.velocity = Vec2::ZERO;
            self.body.set_on_ground(previous_ground);
        }

        self.body.is_on_ground()
    }

    /// Jump if grounded (or unconditionally with `ignore_ground_check`).
    /// Silently ignored otherwise.
    pub fn apply_jump(&mut self, force: f32, ignore_ground_check: bool) {
        if !force.is_finite() {
            log::warn!("ignoring non-finite jump force {}", force);
            return;
        }
        if ignore_ground_check || self.body.is_on_ground() {
            self.body.velocity.y = -force;
            self.body.set_on_ground(false);
        }
    }

    /// Add to horizontal velocity, clamped to `[-max_speed, max_speed]`
    pub fn apply_acceleration(&mut self, delta: f32, max_speed: f32) {
        if !delta.is_finite() || !max_speed.is_finite() {
            log::warn!("ignoring non-finite acceleration {} (max {})", delta, max_speed);
            return;
        }
        let limit = max_speed.abs();
        self.body.velocity.x = (self.body.velocity.x + delta).clamp(-limit, limit);
    }

    // =========================================================================
    // Step stages
    // =========================================================================

    /// No tiles, no gravity, displacement always committed
    fn step_ghost(&mut self, scale: f32) {
        self.body.set_on_ground(false);
        self.apply_friction(scale);
        self.body.position += self.body.velocity * scale;
    }

    /// Top edge of solid footing directly under the collision box at `position`
    fn probe_ground<Q: TileQuery + ?Sized>(&self, tiles: &Q, position: Vec2) -> Option<i32> {
        let collision_box = self.body.collision_box_at(position);
        let probe = collision_box.strip_below(self.config.ground_probe_depth);
        tiles
            .query_tile(probe)
            .filter(|hit| self.supports(&collision_box, hit))
            .map(|hit| hit.tile_rect.top())
    }

    /// Refresh the ground flag. A body hovering inside the probe strip is
    /// pulled down flush onto its footing.
    fn settle<Q: TileQuery + ?Sized>(&mut self, tiles: &Q, mut position: Vec2) -> Vec2 {
        let support = self.probe_ground(tiles, position);
        self.body.set_on_ground(support.is_some());
        if let Some(top) = support {
            if self.body.collision_box_at(position).bottom() < top {
                position.y = self.body.y_for_box_bottom(top);
            }
        }
        position
    }

    /// Whether a tile under `collision_box` can hold the body up
    fn supports(&self, collision_box: &Rect, hit: &TileCollisionResult) -> bool {
        if hit.tile_type.is_penetrable() {
            return false;
        }
        if hit.tile_type.is_platform() {
            // A body still rising through the platform is not standing on it
            return self.body.velocity.y >= 0.0
                && collision_box.bottom() as f32
                    <= hit.tile_rect.top() as f32 + self.config.platform_tolerance;
        }
        true
    }

    fn apply_friction(&mut self, scale: f32) {
        let vx = self.body.velocity.x;
        if vx == 0.0 {
            return;
        }
        let coefficient = if self.body.is_on_ground() {
            self.config.ground_friction
        } else {
            self.config.air_friction
        };
        let reduction = self.config.deceleration * coefficient * scale;
        self.body.velocity.x = if vx > 0.0 {
            (vx - reduction).max(0.0)
        } else {
            (vx + reduction).min(0.0)
        };
    }

    fn apply_gravity(&mut self, scale: f32) {
        if !self.body.is_on_ground() {
            if self.body.has_gravity() {
                let vy = self.body.velocity.y + self.config.gravity * scale;
                self.body.velocity.y = vy.min(self.config.max_fall_speed);
            }
        } else if self.body.velocity.y > 0.0 {
            self.body.velocity.y = 0.0;
        }
    }

    fn resolve_horizontal<Q: TileQuery + ?Sized>(
        &mut self,
        tiles: &Q,
        position: Vec2,
        scale: f32,
    ) -> Vec2 {
        if self.body.velocity.x == 0.0 {
            return position;
        }
        let candidate = position + Vec2::new(self.body.velocity.x * scale, 0.0);
        match tiles.query_tile(self.body.collision_box_at(candidate)) {
            Some(hit) if hit.tile_type.is_blocking() => {
                self.body.velocity.x = 0.0;
                position
            }
            _ => candidate,
        }
    }

    fn resolve_vertical<Q: TileQuery + ?Sized>(
        &mut self,
        tiles: &Q,
        mut position: Vec2,
        scale: f32,
    ) -> Vec2 {
        let vy = self.body.velocity.y;
        if vy == 0.0 {
            return self.settle(tiles, position);
        }

        let dy = vy * scale;
        let candidate = position + Vec2::new(0.0, dy);
        let candidate_box = self.body.collision_box_at(candidate);

        if candidate_box.top() < 0 {
            position.y = self.body.y_for_box_top(0);
            self.body.velocity.y = 0.0;
            self.body.set_on_ground(false);
            return position;
        }

        let Some(hit) = tiles.query_tile(candidate_box) else {
            self.body.set_on_ground(false);
            return candidate;
        };

        if hit.tile_type.is_penetrable() {
            return self.pass_penetrable(tiles, candidate, &candidate_box, dy);
        }

        let falling = vy > self.config.landing_speed_threshold;

        if hit.tile_type.is_platform() {
            let bottom = self.body.collision_box_at(position).bottom() as f32;
            let platform_top = hit.tile_rect.top() as f32;
            if falling && bottom <= platform_top + self.config.platform_tolerance {
                return self.land_on(position, hit.tile_rect.top());
            }
            self.body.set_on_ground(false);
            return candidate;
        }

        // Blocking
        if falling {
            self.land_on(position, hit.tile_rect.top())
        } else if vy < 0.0 {
            position.y = self.body.y_for_box_top(hit.tile_rect.bottom());
            self.body.velocity.y = 0.0;
            self.body.set_on_ground(false);
            position
        } else {
            // Creeping into solid ground below the landing threshold: hold
            // still and let gravity build up until the next step latches on.
            position
        }
    }

    /// Inside a penetrable tile. Look one fall-distance further for footing
    /// so a fast body cannot skip the solid tile hidden underneath.
    fn pass_penetrable<Q: TileQuery + ?Sized>(
        &mut self,
        tiles: &Q,
        candidate: Vec2,
        candidate_box: &Rect,
        dy: f32,
    ) -> Vec2 {
        if dy > 0.0 {
            let depth = dy.abs().ceil() as i32 + self.config.lookahead_margin;
            let probe = candidate_box.strip_below(depth);
            if let Some(ground) = tiles.query_tile(probe) {
                if !ground.tile_type.is_penetrable() {
                    return self.land_on(candidate, ground.tile_rect.top());
                }
            }
        }
        self.body.set_on_ground(false);
        candidate
    }

    fn land_on(&mut self, mut position: Vec2, tile_top: i32) -> Vec2 {
        position.y = self.body.y_for_box_bottom(tile_top);
        self.body.velocity.y = 0.0;
        self.body.set_on_ground(true);
        position
    }
}
