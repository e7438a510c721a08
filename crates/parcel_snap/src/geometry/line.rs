use bevy::prelude::*;

use super::Bounds2;

/// A 2D segment from `a` to `b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line2 {
    pub a: Vec2,
    pub b: Vec2,
}

fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

impl Line2 {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    pub fn length(&self) -> f32 {
        (self.b - self.a).length()
    }

    pub fn position(&self, t: f32) -> Vec2 {
        self.a + (self.b - self.a) * t
    }

    pub fn bounds(&self) -> Bounds2 {
        Bounds2::new(self.a.min(self.b), self.a.max(self.b))
    }

    /// Distance from `point` to the segment and the normalized parameter of
    /// the closest point.
    pub fn distance_to_point(&self, point: Vec2) -> (f32, f32) {
        let ab = self.b - self.a;
        let len_sq = ab.length_squared();
        let t = if len_sq < 1e-12 {
            0.0
        } else {
            ((point - self.a).dot(ab) / len_sq).clamp(0.0, 1.0)
        };
        ((self.position(t) - point).length(), t)
    }

    /// Proper intersection parameters `(t_self, t_other)`, if the segments cross.
    /// Parallel segments report no intersection.
    pub fn intersect(&self, other: &Line2) -> Option<(f32, f32)> {
        let d1 = self.b - self.a;
        let d2 = other.b - other.a;
        let denom = cross(d1, d2);
        if denom.abs() < 1e-9 {
            return None;
        }
        let offset = other.a - self.a;
        let t = cross(offset, d2) / denom;
        let u = cross(offset, d1) / denom;
        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
            Some((t, u))
        } else {
            None
        }
    }

    /// Minimum distance between two segments, with the parameters of the
    /// closest approach on `self` and `other`. Crossing segments report an
    /// exact zero.
    pub fn distance_to_line(&self, other: &Line2) -> (f32, Vec2) {
        if let Some((t, u)) = self.intersect(other) {
            return (0.0, Vec2::new(t, u));
        }

        let (d0, u0) = other.distance_to_point(self.a);
        let (d1, u1) = other.distance_to_point(self.b);
        let (d2, t2) = self.distance_to_point(other.a);
        let (d3, t3) = self.distance_to_point(other.b);

        let mut best = (d0, Vec2::new(0.0, u0));
        if d1 < best.0 {
            best = (d1, Vec2::new(1.0, u1));
        }
        if d2 < best.0 {
            best = (d2, Vec2::new(t2, 0.0));
        }
        if d3 < best.0 {
            best = (d3, Vec2::new(t3, 1.0));
        }
        best
    }
}
