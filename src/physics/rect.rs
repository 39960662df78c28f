//! Integer world rectangle
//!
//! Tiles and collision boxes live on the pixel grid, so everything the
//! collision code compares is integral. Overlap is strict: two rectangles
//! that only share an edge do not intersect.

/// A rectangle defined by its top-left corner and size, in world pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Left edge
    pub fn left(&self) -> i32 {
        self.x
    }

    /// Top edge
    pub fn top(&self) -> i32 {
        self.y
    }

    /// Right edge (exclusive)
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Bottom edge (exclusive)
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Zero or negative area
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Strict overlap test (touching edges do not count)
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Overlapping region, if any
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Some(Rect::new(x, y, right - x, bottom - y))
    }

    /// Thin strip directly below this rectangle, `depth` pixels tall
    pub fn strip_below(&self, depth: i32) -> Self {
        Self::new(self.x, self.bottom(), self.w, depth)
    }
}
