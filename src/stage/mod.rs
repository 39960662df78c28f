//! Stages
//!
//! A stage is a fixed grid of square tiles plus the player spawn point and
//! optional physics tuning. It answers tile queries for the physics system
//! directly from the grid.
//!
//! Stage files are RON with one string per tile row:
//! - `.` empty
//! - `#` blocking
//! - `=` one-way platform
//! - `~` penetrable
//! - `%` penetrable platform (behaves as penetrable)
//!
//! Springs are listed separately by pixel position. They are not tiles:
//! the runtime bounces the player off them through object contacts.

mod io;

pub use io::*;

use macroquad::math::Vec2;
use crate::physics::{PhysicsConfig, Rect, TileCollisionResult, TileQuery, TileType};

/// Width and height of a spring (px)
pub const SPRING_SIZE: i32 = 16;

/// Map a stage file character to a cell
pub fn cell_from_char(c: char) -> Option<Option<TileType>> {
    match c {
        '.' => Some(None),
        '#' => Some(Some(TileType::BLOCKING)),
        '=' => Some(Some(TileType::PLATFORM)),
        '~' => Some(Some(TileType::PENETRABLE)),
        '%' => Some(Some(TileType::PENETRABLE | TileType::PLATFORM)),
        _ => None,
    }
}

/// Map a cell back to its stage file character
pub fn cell_to_char(cell: Option<TileType>) -> char {
    match cell {
        None => '.',
        Some(t) if t.is_blocking() => '#',
        Some(t) if t.is_platform() => '=',
        Some(t) if t.contains(TileType::PLATFORM) => '%',
        Some(_) => '~',
    }
}

#[derive(Debug, Clone)]
pub struct Stage {
    pub name: String,
    tile_size: i32,
    width: usize,
    height: usize,
    spawn: Vec2,
    physics: Option<PhysicsConfig>,
    /// Row-major, `width * height`
    cells: Vec<Option<TileType>>,
    springs: Vec<Rect>,
}

impl Stage {
    /// Empty stage. Sizes are checked by `validate_stage` when loading.
    pub fn new(name: impl Into<String>, tile_size: i32, width: usize, height: usize) -> Self {
        Self {
            name: name.into(),
            tile_size,
            width,
            height,
            spawn: Vec2::ZERO,
            physics: None,
            cells: vec![None; width * height],
            springs: Vec::new(),
        }
    }

    pub fn tile_size(&self) -> i32 {
        self.tile_size
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel_width(&self) -> i32 {
        self.width as i32 * self.tile_size
    }

    pub fn pixel_height(&self) -> i32 {
        self.height as i32 * self.tile_size
    }

    pub fn spawn(&self) -> Vec2 {
        self.spawn
    }

    pub fn set_spawn(&mut self, spawn: Vec2) {
        self.spawn = spawn;
    }

    /// Embedded tuning, if the stage carries any
    pub fn physics(&self) -> Option<&PhysicsConfig> {
        self.physics.as_ref()
    }

    pub fn set_physics(&mut self, physics: Option<PhysicsConfig>) {
        self.physics = physics;
    }

    /// Tuning to run this stage with
    pub fn physics_config(&self) -> PhysicsConfig {
        self.physics.clone().unwrap_or_default()
    }

    fn index(&self, col: usize, row: usize) -> Option<usize> {
        (col < self.width && row < self.height).then(|| row * self.width + col)
    }

    pub fn tile(&self, col: usize, row: usize) -> Option<TileType> {
        self.index(col, row).and_then(|i| self.cells[i])
    }

    /// Out-of-range writes are ignored
    pub fn set_tile(&mut self, col: usize, row: usize, tile: Option<TileType>) {
        if let Some(i) = self.index(col, row) {
            self.cells[i] = tile;
        }
    }

    pub fn springs(&self) -> &[Rect] {
        &self.springs
    }

    /// Place a spring with its top-left corner at `(x, y)`
    pub fn add_spring(&mut self, x: i32, y: i32) {
        self.springs.push(Rect::new(x, y, SPRING_SIZE, SPRING_SIZE));
    }

    /// World rectangle covered by a cell
    pub fn tile_rect(&self, col: usize, row: usize) -> Rect {
        Rect::new(
            col as i32 * self.tile_size,
            row as i32 * self.tile_size,
            self.tile_size,
            self.tile_size,
        )
    }

    /// All occupied cells with their world rectangles
    pub fn tiles(&self) -> impl Iterator<Item = (Rect, TileType)> + '_ {
        self.cells.iter().enumerate().filter_map(|(i, cell)| {
            cell.map(|t| (self.tile_rect(i % self.width, i / self.width), t))
        })
    }

    /// Cells covering `start..end` on one axis, clamped to the grid
    fn cell_span(&self, start: i32, end: i32, cells: usize) -> Option<(usize, usize)> {
        if end <= start || cells == 0 || self.tile_size <= 0 {
            return None;
        }
        let first = start.div_euclid(self.tile_size).max(0);
        let last = (end - 1).div_euclid(self.tile_size).min(cells as i32 - 1);
        (first <= last).then(|| (first as usize, last as usize))
    }
}

impl TileQuery for Stage {
    fn query_tile(&self, rect: Rect) -> Option<TileCollisionResult> {
        let (col_start, col_end) = self.cell_span(rect.left(), rect.right(), self.width)?;
        let (row_start, row_end) = self.cell_span(rect.top(), rect.bottom(), self.height)?;

        let mut best: Option<TileCollisionResult> = None;
        for row in row_start..=row_end {
            for col in col_start..=col_end {
                let Some(tile_type) = self.tile(col, row) else {
                    continue;
                };
                let hit = TileCollisionResult::new(tile_type, self.tile_rect(col, row));
                if best.map_or(true, |b| hit.outranks(&b)) {
                    best = Some(hit);
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{KinematicBody, PhysicsSystem};
    use macroquad::math::IVec2;

    fn sample() -> Stage {
        load_stage_from_str(
            r########"(
                name: "test",
                tile_size: 16,
                width: 6,
                height: 4,
                spawn: (16.0, 0.0),
                rows: [
                    "......",
                    "..==..",
                    "~~~...",
                    "######",
                ],
            )"########,
        )
        .unwrap()
    }

    #[test]
    fn test_query_picks_most_solid() {
        let stage = sample();
        let hit = stage.query_tile(Rect::new(0, 40, 8, 16)).unwrap();
        assert_eq!(hit.tile_type, TileType::BLOCKING);
        assert_eq!(hit.tile_rect, Rect::new(0, 48, 16, 16));

        let hit = stage.query_tile(Rect::new(0, 32, 8, 8)).unwrap();
        assert!(hit.tile_type.is_penetrable());
    }

    #[test]
    fn test_query_outside_grid_is_empty() {
        let stage = sample();
        assert!(stage.query_tile(Rect::new(-40, -40, 16, 16)).is_none());
        assert!(stage.query_tile(Rect::new(200, 0, 16, 16)).is_none());
        // Touching a tile edge is not an overlap
        assert!(stage.query_tile(Rect::new(64, 0, 16, 32)).is_none());
    }

    #[test]
    fn test_tiles_iterator() {
        let stage = sample();
        assert_eq!(stage.tiles().count(), 2 + 3 + 6);
        assert!(stage
            .tiles()
            .any(|(rect, t)| rect == Rect::new(32, 16, 16, 16) && t.is_platform()));
    }

    #[test]
    fn test_body_lands_on_stage_floor() {
        let stage = sample();
        let body = KinematicBody::new(Vec2::new(70.0, 0.0), IVec2::new(16, 16)).unwrap();
        let mut physics = PhysicsSystem::new(body, stage.physics_config()).unwrap();

        for _ in 0..120 {
            physics.step(&stage, 1.0 / 60.0);
        }
        assert!(physics.is_on_ground());
        assert_eq!(physics.body().collision_box().bottom(), 48);
    }

    #[test]
    fn test_cell_chars_round_trip() {
        for c in ['.', '#', '=', '~', '%'] {
            let cell = cell_from_char(c).unwrap();
            assert_eq!(cell_to_char(cell), c);
        }
        assert!(cell_from_char('x').is_none());
    }
}
