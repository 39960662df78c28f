//! Object-vs-object contact
//!
//! Tiles go through the physics system; entities touching each other
//! (springs, moving platforms, pickups) only need to know that they overlap
//! and which side of the other object was hit.

use super::rect::Rect;

/// Side of the *other* object that was touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionDirection {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectCollision {
    pub intersection: Rect,
    pub direction: CollisionDirection,
}

impl ObjectCollision {
    /// Contact between `a` and `b`, or None when they don't overlap.
    /// The side with the smallest overlap wins; ties go Top, Bottom, Left, Right.
    pub fn between(a: &Rect, b: &Rect) -> Option<Self> {
        let intersection = a.intersection(b)?;
        Some(Self {
            intersection,
            direction: direction_of(a, b),
        })
    }
}

fn direction_of(a: &Rect, b: &Rect) -> CollisionDirection {
    let overlap_left = (a.right() - b.left()).abs();
    let overlap_right = (b.right() - a.left()).abs();
    let overlap_top = (a.bottom() - b.top()).abs();
    let overlap_bottom = (b.bottom() - a.top()).abs();
    let min = overlap_left.min(overlap_right).min(overlap_top).min(overlap_bottom);

    if min == overlap_top {
        CollisionDirection::Top
    } else if min == overlap_bottom {
        CollisionDirection::Bottom
    } else if min == overlap_left {
        CollisionDirection::Left
    } else {
        CollisionDirection::Right
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landing_on_top() {
        let player = Rect::new(10, 0, 16, 32);
        let spring = Rect::new(10, 30, 16, 16);
        let contact = ObjectCollision::between(&player, &spring).unwrap();
        assert_eq!(contact.direction, CollisionDirection::Top);
        assert_eq!(contact.intersection, Rect::new(10, 30, 16, 2));
    }

    #[test]
    fn test_side_hits() {
        let platform = Rect::new(100, 100, 32, 8);
        let from_left = Rect::new(70, 90, 32, 32);
        assert_eq!(
            ObjectCollision::between(&from_left, &platform).unwrap().direction,
            CollisionDirection::Left
        );
        let from_right = Rect::new(130, 90, 32, 32);
        assert_eq!(
            ObjectCollision::between(&from_right, &platform).unwrap().direction,
            CollisionDirection::Right
        );
        let from_below = Rect::new(100, 105, 32, 32);
        assert_eq!(
            ObjectCollision::between(&from_below, &platform).unwrap().direction,
            CollisionDirection::Bottom
        );
    }

    #[test]
    fn test_no_contact_when_apart() {
        assert!(ObjectCollision::between(&Rect::new(0, 0, 4, 4), &Rect::new(4, 0, 4, 4)).is_none());
    }

    #[test]
    fn test_tie_prefers_top() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(0, 0, 10, 10);
        assert_eq!(ObjectCollision::between(&a, &b).unwrap().direction, CollisionDirection::Top);
    }
}
