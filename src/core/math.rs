// Geometry helpers: axis-aligned regions and overlap tests

use glam::Vec2;
use parry2d::bounding_volume::{Aabb, BoundingVolume};
use parry2d::math::Point;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Create a rectangle from its corners (corners are normalized)
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create a rectangle centered on a point
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size.abs() * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    fn to_aabb(self) -> Aabb {
        Aabb::new(
            Point::new(self.min.x, self.min.y),
            Point::new(self.max.x, self.max.y),
        )
    }

    /// Spatial overlap test between two regions.
    ///
    /// Touching edges count as overlap, matching parry's AABB semantics.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.to_aabb().intersects(&other.to_aabb())
    }
}
