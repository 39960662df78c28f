//! Kinematic body
//!
//! The per-entity state the physics system reads and writes: sprite origin,
//! velocity, collision box size and the ground flag. Sizes are validated
//! when the body is built or resized, never during a step.

use macroquad::math::{IVec2, Vec2};
use thiserror::Error;
use super::rect::Rect;

/// Errors raised while building or resizing a body
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BodyError {
    #[error("collision box must be positive, got {width}x{height}")]
    InvalidSize { width: i32, height: i32 },
    #[error("sprite size must be positive, got {width}x{height}")]
    InvalidSpriteSize { width: i32, height: i32 },
    #[error("position must be finite, got ({x}, {y})")]
    NonFinitePosition { x: f32, y: f32 },
}

/// Where the collision box sits relative to the sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionAnchor {
    /// Box shares the sprite's top-left corner
    #[default]
    TopLeft,
    /// Box is centred horizontally and flush with the sprite's bottom edge
    BottomCenter,
}

#[derive(Debug, Clone)]
pub struct KinematicBody {
    /// Top-left of the sprite in world pixels
    pub position: Vec2,
    /// Pixels per 60 Hz tick
    pub velocity: Vec2,
    size: IVec2,
    sprite_size: IVec2,
    anchor: CollisionAnchor,
    on_ground: bool,
    has_gravity: bool,
    has_collisions: bool,
}

fn check_size(size: IVec2) -> Result<(), BodyError> {
    if size.x <= 0 || size.y <= 0 {
        return Err(BodyError::InvalidSize { width: size.x, height: size.y });
    }
    Ok(())
}

impl KinematicBody {
    /// Body whose collision box is the whole sprite
    pub fn new(position: Vec2, size: IVec2) -> Result<Self, BodyError> {
        Self::with_sprite(position, size, size, CollisionAnchor::TopLeft)
    }

    pub fn with_sprite(
        position: Vec2,
        sprite_size: IVec2,
        size: IVec2,
        anchor: CollisionAnchor,
    ) -> Result<Self, BodyError> {
        check_size(size)?;
        if sprite_size.x <= 0 || sprite_size.y <= 0 {
            return Err(BodyError::InvalidSpriteSize {
                width: sprite_size.x,
                height: sprite_size.y,
            });
        }
        if !position.is_finite() {
            return Err(BodyError::NonFinitePosition { x: position.x, y: position.y });
        }
        Ok(Self {
            position,
            velocity: Vec2::ZERO,
            size,
            sprite_size,
            anchor,
            on_ground: false,
            has_gravity: true,
            has_collisions: true,
        })
    }

    pub fn size(&self) -> IVec2 {
        self.size
    }

    pub fn sprite_size(&self) -> IVec2 {
        self.sprite_size
    }

    pub fn anchor(&self) -> CollisionAnchor {
        self.anchor
    }

    /// Change the collision box (crouching etc). The sprite origin stays put.
    pub fn resize(&mut self, size: IVec2) -> Result<(), BodyError> {
        check_size(size)?;
        self.size = size;
        Ok(())
    }

    /// Not meaningful until the body has been stepped once
    pub fn is_on_ground(&self) -> bool {
        self.on_ground
    }

    /// Gameplay override, e.g. standing on a moving platform object
    pub fn set_on_ground(&mut self, on_ground: bool) {
        self.on_ground = on_ground;
    }

    pub fn has_gravity(&self) -> bool {
        self.has_gravity
    }

    /// Disabling gravity also stops the body dead
    pub fn set_has_gravity(&mut self, has_gravity: bool) {
        self.has_gravity = has_gravity;
        if !has_gravity {
            self.velocity = Vec2::ZERO;
        }
    }

    pub fn has_collisions(&self) -> bool {
        self.has_collisions
    }

    pub fn set_has_collisions(&mut self, has_collisions: bool) {
        self.has_collisions = has_collisions;
    }

    /// Offset of the collision box from the floored sprite origin
    pub fn anchor_offset(&self) -> IVec2 {
        match self.anchor {
            CollisionAnchor::TopLeft => IVec2::ZERO,
            CollisionAnchor::BottomCenter => IVec2::new(
                self.sprite_size.x / 2 - self.size.x / 2,
                self.sprite_size.y - self.size.y,
            ),
        }
    }

    /// Collision box if the sprite origin were at `position`
    pub fn collision_box_at(&self, position: Vec2) -> Rect {
        let offset = self.anchor_offset();
        Rect::new(
            position.x.floor() as i32 + offset.x,
            position.y.floor() as i32 + offset.y,
            self.size.x,
            self.size.y,
        )
    }

    pub fn collision_box(&self) -> Rect {
        self.collision_box_at(self.position)
    }

    /// Sprite y that puts the collision box bottom on `bottom`
    pub fn y_for_box_bottom(&self, bottom: i32) -> f32 {
        (bottom - self.size.y - self.anchor_offset().y) as f32
    }

    /// Sprite y that puts the collision box top on `top`
    pub fn y_for_box_top(&self, top: i32) -> f32 {
        (top - self.anchor_offset().y) as f32
    }

    /// Position and velocity are both finite
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }
}
