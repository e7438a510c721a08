use bevy::prelude::*;

use crate::config::HALF_CELL;
use crate::error::SnapError;
use crate::geometry::right_of;

/// Footprint of the parcel being placed, derived once per request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParcelFootprint {
    /// Lot size in cells: `x` is width (along the front), `y` is depth.
    pub lot_size: IVec2,
    /// World-space half width (`x`) and half depth (`y`).
    pub half_extents: Vec2,
}

impl ParcelFootprint {
    pub fn new(lot_size: IVec2) -> Result<Self, SnapError> {
        if lot_size.x <= 0 || lot_size.y <= 0 {
            return Err(SnapError::InvalidLotSize(lot_size));
        }
        Ok(Self {
            lot_size,
            half_extents: lot_size.as_vec2() * HALF_CELL,
        })
    }

    pub fn half_width(&self) -> f32 {
        self.half_extents.x
    }

    pub fn half_depth(&self) -> f32 {
        self.half_extents.y
    }

    /// Longer half extent, used to size search areas.
    pub fn max_half_extent(&self) -> f32 {
        self.half_extents.x.max(self.half_extents.y)
    }

    /// World corners at a hypothetical transform, in the order
    /// front-left, front-right, back-right, back-left.
    pub fn corners(&self, center: Vec2, forward: Vec2) -> [Vec2; 4] {
        lot_corners(center, forward, self.half_extents)
    }

    /// Midpoint of the front edge.
    pub fn front_position(&self, center: Vec2, forward: Vec2) -> Vec2 {
        center + forward * self.half_depth()
    }
}

/// Corners of any lot with the given half extents.
pub fn lot_corners(center: Vec2, forward: Vec2, half_extents: Vec2) -> [Vec2; 4] {
    let right = right_of(forward) * half_extents.x;
    let front = forward * half_extents.y;
    [
        center + front - right,
        center + front + right,
        center - front + right,
        center - front - right,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footprint_rejects_non_positive() {
        assert!(matches!(
            ParcelFootprint::new(IVec2::new(0, 4)),
            Err(SnapError::InvalidLotSize(_))
        ));
        assert!(ParcelFootprint::new(IVec2::new(3, -1)).is_err());
    }

    #[test]
    fn test_footprint_half_extents() {
        let fp = ParcelFootprint::new(IVec2::new(3, 5)).expect("valid");
        assert!((fp.half_width() - 12.0).abs() < f32::EPSILON);
        assert!((fp.half_depth() - 20.0).abs() < f32::EPSILON);
        assert!((fp.max_half_extent() - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_corners_facing_plus_z() {
        let fp = ParcelFootprint::new(IVec2::new(2, 4)).expect("valid");
        let [fl, fr, br, bl] = fp.corners(Vec2::ZERO, Vec2::Y);
        assert!((fl - Vec2::new(-8.0, 16.0)).length() < 1e-6);
        assert!((fr - Vec2::new(8.0, 16.0)).length() < 1e-6);
        assert!((br - Vec2::new(8.0, -16.0)).length() < 1e-6);
        assert!((bl - Vec2::new(-8.0, -16.0)).length() < 1e-6);
        assert!((fp.front_position(Vec2::ZERO, Vec2::Y) - Vec2::new(0.0, 16.0)).length() < 1e-6);
    }
}
