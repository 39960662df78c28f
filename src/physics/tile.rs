//! Tile lookup contract
//!
//! The physics system never owns a map. It asks a `TileQuery` what occupies
//! a rectangle and gets back the tile's type flags and world rectangle.

use bitflags::bitflags;
use super::rect::Rect;

bitflags! {
    /// Tile behaviour flags. A tile with neither flag set is blocking.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TileType: u8 {
        /// Does not stop movement; may hide solid ground underneath
        const PENETRABLE = 1 << 0;
        /// One-way: solid only when landed on from above
        const PLATFORM = 1 << 1;
    }
}

impl TileType {
    /// Fully solid from every direction
    pub const BLOCKING: Self = Self::empty();

    pub fn is_penetrable(self) -> bool {
        self.contains(Self::PENETRABLE)
    }

    /// One-way platform. Penetrable wins when both flags are set.
    pub fn is_platform(self) -> bool {
        self.contains(Self::PLATFORM) && !self.is_penetrable()
    }

    pub fn is_blocking(self) -> bool {
        !self.intersects(Self::PENETRABLE | Self::PLATFORM)
    }

    /// Ordering used when a query overlaps several tiles
    pub fn solidity(self) -> u8 {
        if self.is_blocking() {
            2
        } else if self.is_platform() {
            1
        } else {
            0
        }
    }
}

/// A tile hit reported by a `TileQuery`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCollisionResult {
    pub tile_type: TileType,
    /// World-space rectangle of the tile, used to snap bodies to its edges
    pub tile_rect: Rect,
}

impl TileCollisionResult {
    pub fn new(tile_type: TileType, tile_rect: Rect) -> Self {
        Self { tile_type, tile_rect }
    }

    /// True if `self` should be reported in preference to `other`:
    /// more solid first, then topmost, then leftmost.
    pub fn outranks(&self, other: &TileCollisionResult) -> bool {
        let a = (std::cmp::Reverse(self.tile_type.solidity()), self.tile_rect.y, self.tile_rect.x);
        let b = (std::cmp::Reverse(other.tile_type.solidity()), other.tile_rect.y, other.tile_rect.x);
        a < b
    }
}

/// Answers "which tile, if any, occupies this rectangle".
///
/// Implementations must be deterministic for a static map and free of side
/// effects; the physics system may call them several times per step.
pub trait TileQuery {
    fn query_tile(&self, rect: Rect) -> Option<TileCollisionResult>;
}

impl<T: TileQuery + ?Sized> TileQuery for &T {
    fn query_tile(&self, rect: Rect) -> Option<TileCollisionResult> {
        (**self).query_tile(rect)
    }
}

/// Loose tiles with arbitrary rectangles (moving platforms, tests)
impl TileQuery for [TileCollisionResult] {
    fn query_tile(&self, rect: Rect) -> Option<TileCollisionResult> {
        let mut best: Option<TileCollisionResult> = None;
        for tile in self.iter().filter(|t| t.tile_rect.intersects(&rect)) {
            if best.map_or(true, |b| tile.outranks(&b)) {
                best = Some(*tile);
            }
        }
        best
    }
}

impl TileQuery for Vec<TileCollisionResult> {
    fn query_tile(&self, rect: Rect) -> Option<TileCollisionResult> {
        self.as_slice().query_tile(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_classification() {
        assert!(TileType::BLOCKING.is_blocking());
        assert!(TileType::PLATFORM.is_platform());
        assert!(!TileType::PLATFORM.is_blocking());
        assert!(TileType::PENETRABLE.is_penetrable());

        let both = TileType::PENETRABLE | TileType::PLATFORM;
        assert!(both.is_penetrable());
        assert!(!both.is_platform());
        assert!(!both.is_blocking());
    }

    #[test]
    fn test_query_prefers_most_solid_then_topmost() {
        let tiles = vec![
            TileCollisionResult::new(TileType::PENETRABLE, Rect::new(0, 0, 16, 16)),
            TileCollisionResult::new(TileType::BLOCKING, Rect::new(0, 32, 16, 16)),
            TileCollisionResult::new(TileType::BLOCKING, Rect::new(0, 16, 16, 16)),
        ];

        let hit = tiles.query_tile(Rect::new(0, 0, 16, 48)).unwrap();
        assert_eq!(hit.tile_type, TileType::BLOCKING);
        assert_eq!(hit.tile_rect.y, 16);

        let hit = tiles.query_tile(Rect::new(0, 0, 16, 8)).unwrap();
        assert_eq!(hit.tile_type, TileType::PENETRABLE);

        assert!(tiles.query_tile(Rect::new(100, 100, 4, 4)).is_none());
    }
}
