use std::f32::consts::{FRAC_PI_2, PI, TAU};

use bevy::prelude::*;

/// Lateral axis to the right of a horizontal forward direction.
/// Matches `rotation * Vec3::X` for `direction_to_rotation(forward)`.
pub fn right_of(forward: Vec2) -> Vec2 {
    Vec2::new(forward.y, -forward.x)
}

pub fn left_of(forward: Vec2) -> Vec2 {
    -right_of(forward)
}

/// Yaw angle of a direction, measured from +Z towards +X.
pub fn heading(direction: Vec2) -> f32 {
    direction.x.atan2(direction.y)
}

/// Rotation about +Y that maps +Z onto `direction`.
pub fn direction_to_rotation(direction: Vec2) -> Quat {
    Quat::from_rotation_y(heading(direction))
}

/// Horizontal forward direction of a rotation. Falls back to +Z when the
/// rotation points straight up or down.
pub fn rotation_to_direction(rotation: Quat) -> Vec2 {
    let forward = (rotation * Vec3::Z).xz();
    let normalized = forward.normalize_or_zero();
    if normalized == Vec2::ZERO {
        Vec2::Y
    } else {
        normalized
    }
}

pub fn rotate_direction(direction: Vec2, angle: f32) -> Vec2 {
    let h = heading(direction) + angle;
    Vec2::new(h.sin(), h.cos())
}

/// Signed heading of `to` relative to `from`, wrapped to (-PI, PI].
pub fn relative_heading(from: Vec2, to: Vec2) -> f32 {
    let mut angle = (heading(to) - heading(from)) % TAU;
    if angle > PI {
        angle -= TAU;
    } else if angle <= -PI {
        angle += TAU;
    }
    angle
}

/// Reduce an angle to the nearest multiple of 90 degrees.
///
/// Returns the quarter-turn count (0..4) and the signed residual
/// `angle - nearest`, e.g. 47 degrees gives `(1, -43 degrees)`.
pub fn right_angle_residual(angle: f32) -> (i32, f32) {
    let quarters = (angle / FRAC_PI_2).round();
    let residual = angle - quarters * FRAC_PI_2;
    ((quarters as i32).rem_euclid(4), residual)
}
