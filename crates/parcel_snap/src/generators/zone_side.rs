//! Zone-side snapping: slide the parcel along the front of a zoning block,
//! locked to the block's cell grid.

use bevy::prelude::*;

use super::{SnapCandidateGenerator, SnapContext};
use crate::components::ZoneBlock;
use crate::config::{CELL_SIZE, HALF_CELL, SNAP_LEVEL_ZONE_SIDE, ZONE_CENTER_BONUS, ZONE_SEARCH_DISTANCE};
use crate::control_point::{ControlPoint, SnapPriority, SnapSource};
use crate::geometry::{right_of, Bounds2, Line2};
use crate::lookup::SnapGeometry;

pub struct ZoneSideGenerator<'a, G> {
    ctx: &'a SnapContext<'a>,
    geometry: &'a G,
    search_line: Line2,
    best_distance: f32,
    best: Option<ControlPoint>,
}

impl<'a, G: SnapGeometry> ZoneSideGenerator<'a, G> {
    /// `search_line` runs through the hit point along the current facing.
    pub fn new(ctx: &'a SnapContext<'a>, geometry: &'a G, search_line: Line2) -> Self {
        Self {
            ctx,
            geometry,
            search_line,
            best_distance: ZONE_SEARCH_DISTANCE,
            best: None,
        }
    }

    /// Lot placement against `block`, with the lateral offset snapped to the
    /// block's cell grid and the front flush with the block front. The lot
    /// center never slides past either end of the block front.
    fn candidate(&self, entity: Entity, block: &ZoneBlock, forward: Vec2) -> ControlPoint {
        let right = right_of(forward);
        let hit = self.ctx.hit();
        let lateral = (hit - block.position.xz()).dot(right);

        let parity = parity_offset(block.size.x, self.ctx.footprint.lot_size.x);
        let half_width = block.half_extents().x;
        let min_step = ((-half_width - parity) / CELL_SIZE).ceil();
        let max_step = ((half_width - parity) / CELL_SIZE).floor();
        let step = ((lateral - parity) / CELL_SIZE).round().max(min_step).min(max_step);
        let snapped = step * CELL_SIZE + parity;
        let depth = block.half_extents().y - self.ctx.footprint.half_depth() - self.ctx.setback;

        let center = block.position.xz() + right * snapped + forward * depth;
        let priority = SnapPriority::from_offset(SNAP_LEVEL_ZONE_SIDE, (center - hit).length());
        self.ctx
            .control_point
            .snapped(center, forward, priority, SnapSource::ZoneSide, entity)
    }

    /// Half the search line; the placed lot front must lie within it.
    fn reach(&self) -> f32 {
        self.search_line.length() * 0.5
    }
}

/// Lateral shift of the lot center off the block grid: half a cell when the
/// combined block and lot width is odd.
pub fn parity_offset(block_width: i32, lot_width: i32) -> f32 {
    if (block_width ^ lot_width) & 1 != 0 {
        HALF_CELL
    } else {
        0.0
    }
}

impl<G: SnapGeometry> SnapCandidateGenerator for ZoneSideGenerator<'_, G> {
    fn search_bounds(&self) -> Bounds2 {
        self.search_line.bounds().expand(ZONE_SEARCH_DISTANCE)
    }

    fn visit(&mut self, _bounds: &Bounds2, entity: Entity) {
        let Some(data) = self.geometry.block(entity) else {
            return;
        };
        if data.parcel_owned {
            return;
        }
        let forward = data.block.direction.normalize_or_zero();
        if forward == Vec2::ZERO {
            return;
        }

        let (mut distance, params) = self.search_line.distance_to_line(&data.block.front_edge());
        if distance == 0.0 {
            // Prefer crossings near the middle of the search line.
            distance -= ZONE_CENTER_BONUS * (1.0 - 2.0 * (params.x - 0.5).abs());
        }
        if distance >= self.best_distance {
            return;
        }
        let candidate = self.candidate(entity, &data.block, forward);
        let front = candidate.position.xz() + forward * self.ctx.footprint.half_depth();
        if (front - self.ctx.hit()).length() > self.reach() {
            return;
        }
        self.best_distance = distance;
        self.best = Some(candidate);
    }

    fn best_candidate(&self) -> Option<ControlPoint> {
        self.best
    }
}
