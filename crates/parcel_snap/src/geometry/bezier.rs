use bevy::prelude::*;

use super::{Bounds2, Line2};

/// Subdivision depth used when searching for the closest point on a curve.
const MAX_SUBDIVISION_DEPTH: u32 = 8;

/// Sub-curves flatter than this (control hull deviation, world units) are
/// treated as straight lines.
const FLATNESS_TOLERANCE: f32 = 0.01;

/// Newton polish iterations applied after subdivision.
const REFINE_ITERATIONS: usize = 4;

/// Cubic Bezier curve with 3D control points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bezier {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
    pub d: Vec3,
}

impl Bezier {
    pub fn new(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> Self {
        Self { a, b, c, d }
    }

    /// Straight curve with control points at thirds, so `t` maps linearly to
    /// arc length.
    pub fn line(from: Vec3, to: Vec3) -> Self {
        Self {
            a: from,
            b: from + (to - from) / 3.0,
            c: from + (to - from) * 2.0 / 3.0,
            d: to,
        }
    }

    /// Evaluate the curve at parameter `t` in [0, 1].
    pub fn position(&self, t: f32) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        let uu = u * u;
        let tt = t * t;
        u * uu * self.a + 3.0 * uu * t * self.b + 3.0 * u * tt * self.c + t * tt * self.d
    }

    /// First derivative at parameter `t`.
    pub fn tangent(&self, t: f32) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        3.0 * u * u * (self.b - self.a)
            + 6.0 * u * t * (self.c - self.b)
            + 3.0 * t * t * (self.d - self.c)
    }

    fn second_derivative(&self, t: f32) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        6.0 * (1.0 - t) * (self.c - 2.0 * self.b + self.a) + 6.0 * t * (self.d - 2.0 * self.c + self.b)
    }

    /// Split at `t` with de Casteljau's construction.
    pub fn split(&self, t: f32) -> (Bezier, Bezier) {
        let ab = self.a.lerp(self.b, t);
        let bc = self.b.lerp(self.c, t);
        let cd = self.c.lerp(self.d, t);
        let abc = ab.lerp(bc, t);
        let bcd = bc.lerp(cd, t);
        let mid = abc.lerp(bcd, t);
        (
            Bezier::new(self.a, ab, abc, mid),
            Bezier::new(mid, bcd, cd, self.d),
        )
    }

    /// Bounds of the control hull in XZ; always contains the curve.
    pub fn bounds_xz(&self) -> Bounds2 {
        Bounds2::from_points(&[self.a.xz(), self.b.xz(), self.c.xz(), self.d.xz()])
    }

    /// Approximate horizontal arc length by sampling.
    pub fn length_xz(&self) -> f32 {
        let steps = 32;
        let mut length = 0.0_f32;
        let mut prev = self.a.xz();
        for i in 1..=steps {
            let pt = self.position(i as f32 / steps as f32).xz();
            length += (pt - prev).length();
            prev = pt;
        }
        length
    }

    fn chord_xz(&self) -> Line2 {
        Line2::new(self.a.xz(), self.d.xz())
    }

    fn is_flat_xz(&self) -> bool {
        let chord = self.chord_xz();
        chord.distance_to_point(self.b.xz()).0 < FLATNESS_TOLERANCE
            && chord.distance_to_point(self.c.xz()).0 < FLATNESS_TOLERANCE
    }

    /// Horizontal distance from `point` to the curve and the parameter of the
    /// closest point.
    ///
    /// Subdivides on an explicit work stack, pruning sub-curves whose hull is
    /// already further away than the best candidate, then polishes the
    /// parameter with a few Newton steps.
    pub fn distance_xz(&self, point: Vec2) -> (f32, f32) {
        let mut best_dist = f32::MAX;
        let mut best_t = 0.0;
        let mut stack: Vec<(Bezier, f32, f32, u32)> = vec![(*self, 0.0, 1.0, 0)];

        while let Some((curve, t0, t1, depth)) = stack.pop() {
            if hull_distance(&curve.bounds_xz(), point) > best_dist {
                continue;
            }
            if depth >= MAX_SUBDIVISION_DEPTH || curve.is_flat_xz() {
                let (dist, lt) = curve.chord_xz().distance_to_point(point);
                if dist < best_dist {
                    best_dist = dist;
                    best_t = t0 + (t1 - t0) * lt;
                }
                continue;
            }
            let (left, right) = curve.split(0.5);
            let mid = (t0 + t1) * 0.5;
            stack.push((right, mid, t1, depth + 1));
            stack.push((left, t0, mid, depth + 1));
        }

        let t = self.refine_xz(point, best_t);
        let dist = (self.position(t).xz() - point).length();
        if dist <= best_dist {
            (dist, t)
        } else {
            (best_dist, best_t)
        }
    }

    fn refine_xz(&self, point: Vec2, mut t: f32) -> f32 {
        for _ in 0..REFINE_ITERATIONS {
            let diff = self.position(t).xz() - point;
            let d1 = self.tangent(t).xz();
            let d2 = self.second_derivative(t).xz();
            let numerator = diff.dot(d1);
            let denominator = d1.length_squared() + diff.dot(d2);
            if denominator.abs() < 1e-8 {
                break;
            }
            t = (t - numerator / denominator).clamp(0.0, 1.0);
        }
        t
    }
}

fn hull_distance(bounds: &Bounds2, point: Vec2) -> f32 {
    let clamped = point.clamp(bounds.min, bounds.max);
    (clamped - point).length()
}
