//! Snap job orchestration.
//!
//! [`resolve_snap`] validates the request, sizes a search area per enabled
//! generator, runs each generator over its spatial index, arbitrates their
//! results and finally resolves the height of the winner. The result is
//! either a strictly better placement or `None` when nothing snapped.

use bevy::prelude::*;

use crate::arbiter::SnapArbiter;
use crate::components::NetLayers;
use crate::config::{
    CELL_SIZE, ROAD_SEARCH_PAD, SNAP_LEVEL_FRONT_ALIGN, SNAP_LEVEL_PARCEL_EDGE, SNAP_LEVEL_ROAD_SIDE,
    SNAP_LEVEL_ZONE_SIDE, ZONE_SEARCH_PAD,
};
use crate::control_point::{ControlPoint, SnapPriority};
use crate::error::SnapError;
use crate::footprint::ParcelFootprint;
use crate::generators::{
    run_generator, ParcelEdgeGenerator, RoadSideGenerator, SnapContext, ZoneSideGenerator,
};
use crate::geometry::Line2;
use crate::height::resolve_height;
use crate::indexes::SnapIndexes;
use crate::lookup::SnapGeometry;
use crate::settings::{SnapModes, SnapSettings};
use crate::terrain::HeightSampler;

/// One placement to resolve.
#[derive(Debug, Clone, Copy)]
pub struct PlacementRequest<'a> {
    /// Raw, unsnapped placement.
    pub control_point: ControlPoint,
    pub lot_size: IVec2,
    pub layers: NetLayers,
    /// Entities the parcel search must ignore, usually the preview batch.
    pub exclude: &'a [Entity],
}

impl<'a> PlacementRequest<'a> {
    pub fn new(control_point: ControlPoint, lot_size: IVec2) -> Self {
        Self {
            control_point,
            lot_size,
            layers: NetLayers::ROAD,
            exclude: &[],
        }
    }

    pub fn with_layers(mut self, layers: NetLayers) -> Self {
        self.layers = layers;
        self
    }

    pub fn excluding(mut self, exclude: &'a [Entity]) -> Self {
        self.exclude = exclude;
        self
    }
}

/// Search extents derived from the footprint, the setback and the current
/// facing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapSearch {
    /// Zone-side search line through the hit point along the facing.
    pub zone_line: Line2,
    pub road_radius: f32,
    pub parcel_radius: f32,
}

impl SnapSearch {
    pub fn new(control_point: &ControlPoint, footprint: &ParcelFootprint, setback: f32) -> Self {
        let hit = control_point.hit_position.xz();
        let reach = footprint.max_half_extent() + setback + ZONE_SEARCH_PAD;
        let dir = control_point.direction;
        Self {
            zone_line: Line2::new(hit - dir * reach, hit + dir * reach),
            road_radius: footprint.half_depth() + setback + ROAD_SEARCH_PAD,
            // Reaches a neighbor edge with the lot turned either way.
            parcel_radius: footprint.max_half_extent() * 2.0 + setback + CELL_SIZE,
        }
    }
}

/// Level each mode snaps at.
const MODE_LEVELS: [(SnapModes, f32); 4] = [
    (SnapModes::ROAD_SIDE, SNAP_LEVEL_ROAD_SIDE),
    (SnapModes::ZONE_SIDE, SNAP_LEVEL_ZONE_SIDE),
    (SnapModes::PARCEL_EDGE, SNAP_LEVEL_PARCEL_EDGE),
    (SnapModes::PARCEL_FRONT_ALIGN, SNAP_LEVEL_FRONT_ALIGN),
];

/// Enabled modes that snap above `level`.
pub fn modes_above(modes: SnapModes, level: f32) -> SnapModes {
    let mut above = SnapModes::NONE;
    for (mode, mode_level) in MODE_LEVELS {
        if mode_level > level && modes.contains(mode) {
            above.insert(mode);
        }
    }
    above
}

/// Run every generator enabled in `modes` from `ctx` and return the
/// arbitrated winner, which is the baseline itself when nothing snapped.
fn run_generators<G: SnapGeometry, H: HeightSampler>(
    ctx: &SnapContext,
    modes: SnapModes,
    indexes: &SnapIndexes,
    geometry: &G,
    heights: &H,
) -> ControlPoint {
    let search = SnapSearch::new(&ctx.control_point, &ctx.footprint, ctx.setback);
    let mut arbiter = SnapArbiter::new(ctx.control_point);
    if modes.contains(SnapModes::ZONE_SIDE) {
        let generator = ZoneSideGenerator::new(ctx, geometry, search.zone_line);
        arbiter.offer(run_generator(&indexes.blocks, generator));
    }
    if modes.contains(SnapModes::ROAD_SIDE) {
        let generator = RoadSideGenerator::new(ctx, geometry, heights, search.road_radius);
        arbiter.offer(run_generator(&indexes.nets, generator));
    }
    if modes.any_parcel() {
        let generator = ParcelEdgeGenerator::new(
            ctx,
            geometry,
            search.parcel_radius,
            modes.contains(SnapModes::PARCEL_EDGE),
            modes.contains(SnapModes::PARCEL_FRONT_ALIGN),
        );
        arbiter.offer(run_generator(&indexes.parcels, generator));
    }
    arbiter.finish()
}

/// Resolve one placement.
///
/// Returns `Ok(None)` when no mode is enabled or nothing snapped. Errors are
/// limited to malformed input; they are raised before any generator runs.
pub fn resolve_snap<G: SnapGeometry, H: HeightSampler>(
    request: &PlacementRequest,
    settings: &SnapSettings,
    indexes: &SnapIndexes,
    geometry: &G,
    heights: &H,
) -> Result<Option<ControlPoint>, SnapError> {
    if settings.modes.is_empty() {
        return Ok(None);
    }
    settings.validate()?;
    let footprint = ParcelFootprint::new(request.lot_size)?;
    if !request.control_point.hit_position.is_finite() {
        return Err(SnapError::NonFiniteHit);
    }

    let baseline = request.control_point;
    let ctx = SnapContext {
        control_point: baseline,
        footprint,
        setback: settings.setback,
        layers: request.layers,
        exclude: request.exclude,
    };

    let mut best = run_generators(&ctx, settings.modes, indexes, geometry, heights);
    if !best.snap_priority.is_higher_than(&baseline.snap_priority) {
        return Ok(None);
    }

    // A winner must still win when resolved again from its own placement.
    // Re-run the modes that outrank it from there and promote whatever they
    // find; each round raises the level, so the loop ends.
    loop {
        let above = modes_above(settings.modes, best.snap_priority.level);
        if above.is_empty() {
            break;
        }
        let settled = ControlPoint::raw(best.position, best.rotation).with_elevation(baseline.elevation);
        let rerun = SnapContext {
            control_point: settled,
            ..ctx
        };
        let promoted = run_generators(&rerun, above, indexes, geometry, heights);
        if !promoted.snap_priority.is_higher_than(&settled.snap_priority) {
            break;
        }
        let offset = (promoted.position.xz() - baseline.hit_position.xz()).length();
        best = ControlPoint {
            hit_position: baseline.hit_position,
            snap_priority: SnapPriority::from_offset(promoted.snap_priority.level, offset),
            ..promoted
        };
    }

    resolve_height(&mut best, &footprint, heights);
    trace!(
        "snapped {:?} to {:?} at {} (level {})",
        baseline.hit_position,
        best.source,
        best.position,
        best.snap_priority.level
    );
    Ok(Some(best))
}

// ---------------------------------------------------------------------------
// Applying a result
// ---------------------------------------------------------------------------

/// Rigid motion taking the raw placement onto the snapped one.
///
/// Applied to every transform of a placement batch so relative offsets
/// between members are preserved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformDelta {
    /// Raw anchor position; rotation happens about this point.
    pub pivot: Vec3,
    /// Where the pivot ends up.
    pub target: Vec3,
    pub rotation: Quat,
}

impl TransformDelta {
    pub fn identity(pivot: Vec3) -> Self {
        Self {
            pivot,
            target: pivot,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn between(raw: &ControlPoint, snapped: &ControlPoint) -> Self {
        Self {
            pivot: raw.position,
            target: snapped.position,
            rotation: (snapped.rotation * raw.rotation.inverse()).normalize(),
        }
    }

    pub fn apply(&self, transform: &Transform) -> Transform {
        Transform {
            translation: self.target + self.rotation * (transform.translation - self.pivot),
            rotation: (self.rotation * transform.rotation).normalize(),
            scale: transform.scale,
        }
    }

    pub fn apply_all(&self, transforms: &mut [Transform]) {
        for transform in transforms {
            *transform = self.apply(transform);
        }
    }
}
