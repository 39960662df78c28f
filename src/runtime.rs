//! Demo runtime
//!
//! Drives one player body around a stage: keyboard intents in, fixed 60 Hz
//! physics steps, macroquad primitives out.

use macroquad::math::{IVec2, Vec2};
use macroquad::prelude::*;
use thiserror::Error;

use crate::physics::{
    BodyError, CollisionAnchor, CollisionDirection, ConfigError, FixedTimestep, KinematicBody,
    ObjectCollision, PhysicsSystem, TileType,
};
use crate::stage::Stage;

/// Upward speed given by a jump
pub const JUMP_FORCE: f32 = 10.0;
/// Horizontal speed added per step while a direction is held
pub const WALK_ACCELERATION: f32 = 0.5;
pub const MAX_WALK_SPEED: f32 = 5.0;
/// Upward speed given by landing on a spring
pub const SPRING_FORCE: f32 = 14.0;

pub const SPRITE_SIZE: IVec2 = IVec2::new(16, 32);
pub const STANDING_SIZE: IVec2 = IVec2::new(16, 32);
pub const CROUCHING_SIZE: IVec2 = IVec2::new(16, 16);

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("player body: {0}")]
    Body(#[from] BodyError),
    #[error("stage physics: {0}")]
    Config(#[from] ConfigError),
}

/// What the player asked for this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Intent {
    pub left: bool,
    pub right: bool,
    /// Crouch
    pub down: bool,
    /// Look up
    pub up: bool,
    /// Edge-triggered
    pub jump: bool,
}

impl Intent {
    /// Arrows or WASD to move, Space or Z to jump
    pub fn from_keyboard() -> Self {
        Self {
            left: is_key_down(KeyCode::Left) || is_key_down(KeyCode::A),
            right: is_key_down(KeyCode::Right) || is_key_down(KeyCode::D),
            down: is_key_down(KeyCode::Down) || is_key_down(KeyCode::S),
            up: is_key_down(KeyCode::Up) || is_key_down(KeyCode::W),
            jump: is_key_pressed(KeyCode::Space) || is_key_pressed(KeyCode::Z),
        }
    }
}

/// Turns intents into physics calls
#[derive(Debug, Clone, Default)]
pub struct PlayerController {
    crouching: bool,
    looking_up: bool,
    /// -1 left, 1 right
    facing: i32,
}

impl PlayerController {
    pub fn new() -> Self {
        Self { facing: 1, ..Default::default() }
    }

    pub fn is_crouching(&self) -> bool {
        self.crouching
    }

    pub fn is_looking_up(&self) -> bool {
        self.looking_up
    }

    pub fn facing(&self) -> i32 {
        self.facing
    }

    /// Apply one step's worth of input
    pub fn apply(&mut self, intent: Intent, physics: &mut PhysicsSystem) -> Result<(), BodyError> {
        if intent.down != self.crouching {
            let size = if intent.down { CROUCHING_SIZE } else { STANDING_SIZE };
            physics.body_mut().resize(size)?;
        }
        self.crouching = intent.down;
        self.looking_up = intent.up;

        if intent.jump && !self.crouching {
            physics.apply_jump(JUMP_FORCE, false);
        }

        if self.crouching || self.looking_up {
            return Ok(());
        }
        if intent.left {
            physics.apply_acceleration(-WALK_ACCELERATION, MAX_WALK_SPEED);
            self.facing = -1;
        }
        if intent.right {
            physics.apply_acceleration(WALK_ACCELERATION, MAX_WALK_SPEED);
            self.facing = 1;
        }
        Ok(())
    }
}

/// A stage with the player running around in it
pub struct StageRuntime {
    stage: Stage,
    physics: PhysicsSystem,
    controller: PlayerController,
    clock: FixedTimestep,
    /// Jump pressed on a frame that ran no steps
    pending_jump: bool,
    previous_position: Vec2,
    respawns: u32,
}

impl StageRuntime {
    pub fn new(stage: Stage) -> Result<Self, RuntimeError> {
        let body = KinematicBody::with_sprite(
            stage.spawn(),
            SPRITE_SIZE,
            STANDING_SIZE,
            CollisionAnchor::BottomCenter,
        )?;
        let physics = PhysicsSystem::new(body, stage.physics_config())?;
        let previous_position = stage.spawn();
        Ok(Self {
            stage,
            physics,
            controller: PlayerController::new(),
            clock: FixedTimestep::sixty_hz(),
            pending_jump: false,
            previous_position,
            respawns: 0,
        })
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn physics(&self) -> &PhysicsSystem {
        &self.physics
    }

    pub fn controller(&self) -> &PlayerController {
        &self.controller
    }

    pub fn respawns(&self) -> u32 {
        self.respawns
    }

    /// Feed one rendered frame. Returns the number of physics steps run.
    pub fn update(&mut self, intent: Intent, frame_seconds: f32) -> Result<u32, RuntimeError> {
        self.pending_jump |= intent.jump;
        let steps = self.clock.advance(frame_seconds);
        let dt = self.clock.step_seconds();

        for _ in 0..steps {
            self.previous_position = self.physics.body().position;
            let step_intent = Intent { jump: self.pending_jump, ..intent };
            self.pending_jump = false;

            self.controller.apply(step_intent, &mut self.physics)?;
            self.physics.step(&self.stage, dt);
            self.bounce_off_springs();

            if self.fell_out() {
                self.respawn()?;
            }
        }
        Ok(steps)
    }

    /// Launch the player when they come down on top of a spring
    fn bounce_off_springs(&mut self) {
        if self.physics.body().velocity.y < 0.0 {
            return;
        }
        let player = self.physics.body().collision_box();
        let landed = self.stage.springs().iter().any(|spring| {
            matches!(
                ObjectCollision::between(&player, spring),
                Some(ObjectCollision { direction: CollisionDirection::Top, .. })
            )
        });
        if landed {
            self.physics.apply_jump(SPRING_FORCE, true);
        }
    }

    fn fell_out(&self) -> bool {
        self.physics.body().collision_box().top() >= self.stage.pixel_height()
    }

    /// Put the player back at the spawn point, standing still
    pub fn respawn(&mut self) -> Result<(), RuntimeError> {
        let spawn = self.stage.spawn();
        let body = self.physics.body_mut();
        body.resize(STANDING_SIZE)?;
        body.position = spawn;
        body.velocity = Vec2::ZERO;
        body.set_on_ground(false);

        self.controller = PlayerController::new();
        self.previous_position = spawn;
        self.clock.reset();
        self.respawns += 1;
        log::info!("player fell out of '{}', respawn #{}", self.stage.name, self.respawns);
        Ok(())
    }

    // =========================================================================
    // Drawing
    // =========================================================================

    pub fn draw(&self) {
        clear_background(Color::from_rgba(92, 148, 252, 255));

        let scale = (screen_height() / self.stage.pixel_height() as f32).max(1.0);
        let player = self.interpolated_position();
        let view_w = screen_width() / scale;
        let max_scroll = (self.stage.pixel_width() as f32 - view_w).max(0.0);
        let scroll = (player.x - view_w / 2.0).clamp(0.0, max_scroll);
        let to_screen = |x: f32, y: f32| ((x - scroll) * scale, y * scale);

        for (rect, tile_type) in self.stage.tiles() {
            let (x, y) = to_screen(rect.x as f32, rect.y as f32);
            let (w, h) = (rect.w as f32 * scale, rect.h as f32 * scale);
            if x + w < 0.0 || x > screen_width() {
                continue;
            }
            draw_tile(tile_type, x, y, w, h);
        }

        for spring in self.stage.springs() {
            let (x, y) = to_screen(spring.x as f32, spring.y as f32);
            let (w, h) = (spring.w as f32 * scale, spring.h as f32 * scale);
            draw_rectangle(x, y + h * 0.5, w, h * 0.5, Color::from_rgba(200, 40, 40, 255));
            draw_rectangle_lines(x, y, w, h, 1.0, Color::from_rgba(255, 220, 220, 255));
        }

        let body = self.physics.body();
        let collision_box = body.collision_box_at(player);
        let (x, y) = to_screen(collision_box.x as f32, collision_box.y as f32);
        let (w, h) = (collision_box.w as f32 * scale, collision_box.h as f32 * scale);
        let color = if self.physics.is_on_ground() { GREEN } else { LIME };
        draw_rectangle(x, y, w, h, color);

        let eye_x = if self.controller.facing() > 0 { x + w * 0.7 } else { x + w * 0.3 };
        let eye_y = if self.controller.is_looking_up() { y + h * 0.1 } else { y + h * 0.25 };
        draw_circle(eye_x, eye_y, 2.0 * scale, WHITE);

        let hud = format!(
            "{}  pos ({:.1}, {:.1})  vel ({:.2}, {:.2})  {}  respawns {}",
            self.stage.name,
            body.position.x,
            body.position.y,
            body.velocity.x,
            body.velocity.y,
            if self.physics.is_on_ground() { "ground" } else { "air" },
            self.respawns,
        );
        draw_text(&hud, 8.0, 20.0, 20.0, WHITE);
    }

    /// Player position blended between the last two steps
    fn interpolated_position(&self) -> Vec2 {
        let alpha = self.clock.alpha().clamp(0.0, 1.0);
        self.previous_position.lerp(self.physics.body().position, alpha)
    }
}

fn draw_tile(tile_type: TileType, x: f32, y: f32, w: f32, h: f32) {
    if tile_type.is_blocking() {
        draw_rectangle(x, y, w, h, Color::from_rgba(160, 96, 48, 255));
        draw_rectangle_lines(x, y, w, h, 1.0, Color::from_rgba(96, 56, 24, 255));
    } else if tile_type.is_platform() {
        draw_rectangle(x, y, w, h * 0.25, Color::from_rgba(240, 200, 80, 255));
    } else {
        draw_rectangle(x, y, w, h, Color::from_rgba(40, 120, 40, 140));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::load_stage_from_str;

    /// Five steps per update at 60 Hz
    const FRAME: f32 = 0.1;

    fn runtime(floor: &str) -> StageRuntime {
        runtime_with(floor, "")
    }

    fn runtime_with(floor: &str, extra: &str) -> StageRuntime {
        let src = format!(
            r#"(
                name: "runtime",
                tile_size: 16,
                width: 10,
                height: 6,
                spawn: (32.0, 16.0),
                rows: [
                    "..........",
                    "..........",
                    "..........",
                    "..........",
                    "..........",
                    "{}",
                ],
                {}
            )"#,
            floor, extra
        );
        StageRuntime::new(load_stage_from_str(&src).unwrap()).unwrap()
    }

    fn settle(rt: &mut StageRuntime) {
        for _ in 0..10 {
            rt.update(Intent::default(), FRAME).unwrap();
        }
    }

    #[test]
    fn test_player_lands_on_floor() {
        let mut rt = runtime("##########");
        assert_eq!(rt.update(Intent::default(), FRAME).unwrap(), 5);
        settle(&mut rt);

        assert!(rt.physics().is_on_ground());
        assert_eq!(rt.physics().body().collision_box().bottom(), 80);
        assert_eq!(rt.respawns(), 0);
    }

    #[test]
    fn test_walking_moves_right() {
        let mut rt = runtime("##########");
        settle(&mut rt);
        let start = rt.physics().body().position.x;

        let walk = Intent { right: true, ..Default::default() };
        for _ in 0..3 {
            rt.update(walk, FRAME).unwrap();
        }
        assert!(rt.physics().body().position.x > start);
        assert!(rt.physics().body().velocity.x > 0.0);
        assert!(rt.physics().body().velocity.x <= MAX_WALK_SPEED);
        assert_eq!(rt.controller().facing(), 1);
    }

    #[test]
    fn test_looking_up_blocks_walking() {
        let mut rt = runtime("##########");
        settle(&mut rt);

        let intent = Intent { right: true, up: true, ..Default::default() };
        rt.update(intent, FRAME).unwrap();
        assert_eq!(rt.physics().body().velocity.x, 0.0);
        assert!(rt.controller().is_looking_up());
    }

    #[test]
    fn test_crouch_shrinks_box_and_blocks_jump() {
        let mut rt = runtime("##########");
        settle(&mut rt);
        let standing_y = rt.physics().body().position.y;

        let crouch = Intent { down: true, jump: true, ..Default::default() };
        rt.update(crouch, FRAME).unwrap();

        let body = rt.physics().body();
        assert_eq!(body.size(), CROUCHING_SIZE);
        assert_eq!(body.collision_box().bottom(), 80);
        assert_eq!(body.position.y, standing_y);
        assert!(rt.physics().is_on_ground());

        rt.update(Intent::default(), FRAME).unwrap();
        assert_eq!(rt.physics().body().size(), STANDING_SIZE);
    }

    #[test]
    fn test_jump_leaves_ground() {
        let mut rt = runtime("##########");
        settle(&mut rt);
        let standing_y = rt.physics().body().position.y;

        rt.update(Intent { jump: true, ..Default::default() }, FRAME).unwrap();
        assert!(rt.physics().body().position.y < standing_y);
        assert!(!rt.physics().is_on_ground());
    }

    #[test]
    fn test_jump_pressed_between_steps_is_kept() {
        let mut rt = runtime("##########");
        settle(&mut rt);
        let standing_y = rt.physics().body().position.y;
        rt.clock.reset();

        // Too short for a step; the press carries over
        assert_eq!(rt.update(Intent { jump: true, ..Default::default() }, 0.001).unwrap(), 0);
        rt.update(Intent::default(), FRAME).unwrap();
        assert!(rt.physics().body().position.y < standing_y);
    }

    #[test]
    fn test_spring_launches_player() {
        let mut rt = runtime_with("##########", "springs: [(32, 64)],");
        let mut fastest_rise = 0.0f32;
        for _ in 0..10 {
            rt.update(Intent::default(), FRAME).unwrap();
            fastest_rise = fastest_rise.min(rt.physics().body().velocity.y);
        }
        // Faster than any jump the player can make from the ground
        assert!(fastest_rise < -JUMP_FORCE);
    }

    #[test]
    fn test_spring_ignores_rising_player() {
        let mut rt = runtime_with("##########", "springs: [(32, 64)],");
        rt.physics.body_mut().position.y = 48.0;
        rt.physics.body_mut().velocity.y = -1.0;

        rt.bounce_off_springs();
        assert_eq!(rt.physics().body().velocity.y, -1.0);
    }

    #[test]
    fn test_respawn_after_falling_out() {
        let mut rt = runtime("..........");
        for _ in 0..20 {
            rt.update(Intent::default(), FRAME).unwrap();
        }
        assert!(rt.respawns() >= 1);
        assert!(rt.physics().body().position.y < rt.stage().pixel_height() as f32);
    }
}
