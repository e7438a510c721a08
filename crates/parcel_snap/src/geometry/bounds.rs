use bevy::prelude::*;

/// Axis-aligned bounds in the XZ plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds2 {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds2 {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Square bounds of half-size `radius` around `center`.
    pub fn around(center: Vec2, radius: f32) -> Self {
        Self {
            min: center - Vec2::splat(radius),
            max: center + Vec2::splat(radius),
        }
    }

    pub fn from_points(points: &[Vec2]) -> Self {
        let mut min = Vec2::splat(f32::MAX);
        let mut max = Vec2::splat(f32::MIN);
        for p in points {
            min = min.min(*p);
            max = max.max(*p);
        }
        Self { min, max }
    }

    pub fn expand(&self, amount: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(amount),
            max: self.max + Vec2::splat(amount),
        }
    }

    pub fn union(&self, other: &Bounds2) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Closed-interval overlap test; touching bounds intersect.
    pub fn intersects(&self, other: &Bounds2) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn contains(&self, other: &Bounds2) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// The four equal quadrants, in the order (-x-z, +x-z, -x+z, +x+z).
    pub fn quadrants(&self) -> [Bounds2; 4] {
        let c = self.center();
        [
            Bounds2::new(self.min, c),
            Bounds2::new(Vec2::new(c.x, self.min.y), Vec2::new(self.max.x, c.y)),
            Bounds2::new(Vec2::new(self.min.x, c.y), Vec2::new(c.x, self.max.y)),
            Bounds2::new(c, self.max),
        ]
    }
}
