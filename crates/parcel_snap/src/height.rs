use bevy::prelude::*;

use crate::control_point::ControlPoint;
use crate::footprint::ParcelFootprint;
use crate::terrain::HeightSampler;

/// Set the vertical coordinate of a snapped control point: ground height at
/// the middle of the lot's front edge plus the requested elevation.
pub fn resolve_height<H: HeightSampler>(
    control_point: &mut ControlPoint,
    footprint: &ParcelFootprint,
    heights: &H,
) {
    let front = footprint.front_position(control_point.position.xz(), control_point.direction);
    let sample_at = Vec3::new(front.x, control_point.position.y, front.y);
    control_point.position.y = heights.sample_height(sample_at) + control_point.elevation;
}
