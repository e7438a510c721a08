//! Parcel-to-parcel snapping.
//!
//! Two behaviours share one walk over the parcel index:
//!
//! * edge slide: the new lot rests flush against one of a neighbor's four
//!   edges, its facing rounded to the nearest right angle relative to that
//!   edge;
//! * front align: the new lot's front corner locks onto a neighbor's front
//!   corner so both fronts form one continuous line.
//!
//! Front align always outranks an edge slide. Within a level the closer
//! placement wins.

use std::cmp::Ordering;

use bevy::prelude::*;

use super::{SnapCandidateGenerator, SnapContext};
use crate::config::{
    CELL_SIZE, FRONT_ALIGN_RADIUS, RELATION_TOLERANCE, SNAP_LEVEL_FRONT_ALIGN,
    SNAP_LEVEL_PARCEL_EDGE,
};
use crate::control_point::{ControlPoint, SnapPriority, SnapSource};
use crate::geometry::{relative_heading, right_angle_residual, right_of, rotate_direction, Bounds2, Line2};
use crate::lookup::{ParcelData, SnapGeometry};

/// Facing of the new lot relative to the outward normal of the edge it
/// rests against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeRelation {
    /// Facing away from the neighbor.
    Forward,
    /// Facing into the neighbor.
    Back,
    Left,
    Right,
}

/// Rotate `facing` by the smallest angle that makes it a right-angle
/// multiple of `edge_normal`. Returns the corrected facing and the residual
/// that was removed.
pub fn align_facing(edge_normal: Vec2, facing: Vec2) -> (Vec2, f32) {
    let (_, residual) = right_angle_residual(relative_heading(edge_normal, facing));
    (rotate_direction(facing, -residual), residual)
}

pub fn classify_relation(edge_normal: Vec2, facing: Vec2) -> Option<EdgeRelation> {
    let along = facing.dot(edge_normal);
    let across = facing.dot(right_of(edge_normal));
    if (along - 1.0).abs() < RELATION_TOLERANCE {
        Some(EdgeRelation::Forward)
    } else if (along + 1.0).abs() < RELATION_TOLERANCE {
        Some(EdgeRelation::Back)
    } else if (across - 1.0).abs() < RELATION_TOLERANCE {
        Some(EdgeRelation::Right)
    } else if (across + 1.0).abs() < RELATION_TOLERANCE {
        Some(EdgeRelation::Left)
    } else {
        None
    }
}

/// Center of a lot whose front corner sits on `corner`.
///
/// With `is_right_side` the lot's front-right corner is placed (the lot
/// extends to the left of the corner), otherwise its front-left corner.
pub fn front_align_center(corner: Vec2, forward: Vec2, half_extents: Vec2, is_right_side: bool) -> Vec2 {
    let right = right_of(forward) * half_extents.x;
    let back = forward * half_extents.y;
    if is_right_side {
        corner - right - back
    } else {
        corner + right - back
    }
}

struct NeighborEdge {
    line: Line2,
    normal: Vec2,
    /// How far, in cells, the slide may overhang either end of the edge.
    max_offset: f32,
}

fn neighbor_edges(neighbor: &ParcelData) -> [NeighborEdge; 4] {
    let forward = neighbor.forward();
    let right = right_of(forward);
    let [fl, fr, br, bl] = neighbor.corners();
    let width = neighbor.lot_size.x as f32;
    let depth = neighbor.lot_size.y as f32;
    [
        NeighborEdge {
            line: Line2::new(fl, fr),
            normal: forward,
            max_offset: width * 0.5,
        },
        NeighborEdge {
            line: Line2::new(fr, br),
            normal: right,
            max_offset: depth * 0.5,
        },
        NeighborEdge {
            line: Line2::new(br, bl),
            normal: -forward,
            max_offset: width * 0.5,
        },
        NeighborEdge {
            line: Line2::new(bl, fl),
            normal: -right,
            max_offset: depth * 0.5,
        },
    ]
}

pub struct ParcelEdgeGenerator<'a, G> {
    ctx: &'a SnapContext<'a>,
    geometry: &'a G,
    radius: f32,
    edge_snap: bool,
    front_align: bool,
    best_distance: f32,
    best_priority: SnapPriority,
    best: Option<ControlPoint>,
}

impl<'a, G: SnapGeometry> ParcelEdgeGenerator<'a, G> {
    pub fn new(
        ctx: &'a SnapContext<'a>,
        geometry: &'a G,
        radius: f32,
        edge_snap: bool,
        front_align: bool,
    ) -> Self {
        Self {
            ctx,
            geometry,
            radius,
            edge_snap,
            front_align,
            best_distance: radius,
            best_priority: ctx.control_point.snap_priority,
            best: None,
        }
    }

    fn offer(&mut self, entity: Entity, center: Vec2, facing: Vec2, level: f32, source: SnapSource) {
        let distance = (center - self.ctx.hit()).length();
        let accepted = match level.total_cmp(&self.best_priority.level) {
            Ordering::Greater => true,
            Ordering::Equal => distance < self.best_distance,
            Ordering::Less => false,
        };
        if !accepted {
            return;
        }
        let priority = SnapPriority::from_offset(level, distance);
        self.best_distance = distance;
        self.best_priority = priority;
        self.best = Some(self.ctx.control_point.snapped(center, facing, priority, source, entity));
    }

    fn try_front_align(&mut self, entity: Entity, neighbor: &ParcelData) {
        let forward = neighbor.forward();
        let [fl, fr, _, _] = neighbor.corners();
        let half_extents = self.ctx.footprint.half_extents;
        let hit = self.ctx.hit();

        let beside_right = front_align_center(fr, forward, half_extents, false);
        let beside_left = front_align_center(fl, forward, half_extents, true);
        let center = if (beside_right - hit).length() <= (beside_left - hit).length() {
            beside_right
        } else {
            beside_left
        };
        if (center - hit).length() >= FRONT_ALIGN_RADIUS {
            return;
        }
        self.offer(entity, center, forward, SNAP_LEVEL_FRONT_ALIGN, SnapSource::FrontAlign);
    }

    fn try_edge(&mut self, entity: Entity, edge: &NeighborEdge) {
        let along = edge.line.b - edge.line.a;
        let length = along.length();
        if length < f32::EPSILON {
            return;
        }
        let dir = along / length;
        let hit = self.ctx.hit();

        let slack = CELL_SIZE * edge.max_offset;
        let t = (hit - edge.line.a).dot(dir).clamp(-slack, length + slack);
        let point = edge.line.a + dir * t;

        let (facing, _) = align_facing(edge.normal, self.ctx.direction());
        let Some(relation) = classify_relation(edge.normal, facing) else {
            return;
        };
        let extent = match relation {
            EdgeRelation::Forward | EdgeRelation::Back => self.ctx.footprint.half_depth(),
            EdgeRelation::Left | EdgeRelation::Right => self.ctx.footprint.half_width(),
        };
        let center = point + edge.normal * (extent + self.ctx.setback);
        if (center - hit).length() >= self.radius {
            return;
        }
        self.offer(entity, center, facing, SNAP_LEVEL_PARCEL_EDGE, SnapSource::ParcelEdge);
    }
}

impl<G: SnapGeometry> SnapCandidateGenerator for ParcelEdgeGenerator<'_, G> {
    fn search_bounds(&self) -> Bounds2 {
        Bounds2::around(self.ctx.hit(), self.radius)
    }

    fn visit(&mut self, _bounds: &Bounds2, entity: Entity) {
        if self.ctx.is_excluded(entity) {
            return;
        }
        let Some(neighbor) = self.geometry.parcel(entity) else {
            return;
        };
        if self.front_align {
            self.try_front_align(entity, &neighbor);
        }
        if self.edge_snap {
            for edge in neighbor_edges(&neighbor) {
                self.try_edge(entity, &edge);
            }
        }
    }

    fn best_candidate(&self) -> Option<ControlPoint> {
        self.best
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;
    use crate::components::NetLayers;
    use crate::footprint::ParcelFootprint;
    use crate::geometry::heading;
    use crate::lookup::GeometrySnapshot;

    fn neighbor_snapshot(entity: Entity) -> GeometrySnapshot {
        let mut snapshot = GeometrySnapshot::default();
        snapshot.insert_parcel(
            entity,
            ParcelData {
                position: Vec3::ZERO,
                rotation: Quat::IDENTITY,
                lot_size: IVec2::new(2, 2),
            },
        );
        snapshot
    }

    fn run(
        hit: Vec3,
        rotation: Quat,
        snapshot: &GeometrySnapshot,
        exclude: &[Entity],
        edge_snap: bool,
        front_align: bool,
    ) -> Option<ControlPoint> {
        let ctx = SnapContext {
            control_point: ControlPoint::raw(hit, rotation),
            footprint: ParcelFootprint::new(IVec2::new(2, 2)).expect("valid lot"),
            setback: 0.0,
            layers: NetLayers::ROAD,
            exclude,
        };
        let mut generator = ParcelEdgeGenerator::new(&ctx, snapshot, 40.0, edge_snap, front_align);
        generator.visit(&Bounds2::around(Vec2::ZERO, 0.0), Entity::from_raw(1));
        generator.best_candidate()
    }

    #[test]
    fn test_residual_47_degrees() {
        let normal = Vec2::X;
        let facing = rotate_direction(normal, 47f32.to_radians());
        let (corrected, residual) = align_facing(normal, facing);
        assert!((residual.to_degrees() + 43.0).abs() < 1e-3, "residual {}", residual.to_degrees());
        assert!((relative_heading(normal, corrected) - FRAC_PI_2).abs() < 1e-4);
        assert_eq!(classify_relation(normal, corrected), Some(EdgeRelation::Right));
    }

    #[test]
    fn test_relation_classification() {
        let n = Vec2::Y;
        assert_eq!(classify_relation(n, Vec2::Y), Some(EdgeRelation::Forward));
        assert_eq!(classify_relation(n, -Vec2::Y), Some(EdgeRelation::Back));
        assert_eq!(classify_relation(n, Vec2::X), Some(EdgeRelation::Right));
        assert_eq!(classify_relation(n, -Vec2::X), Some(EdgeRelation::Left));
        assert_eq!(classify_relation(n, Vec2::new(1.0, 1.0).normalize()), None);
    }

    #[test]
    fn test_front_align_formula() {
        let half = Vec2::new(8.0, 8.0);
        let c = front_align_center(Vec2::new(8.0, 8.0), Vec2::Y, half, false);
        assert!((c - Vec2::new(16.0, 0.0)).length() < 1e-5);
        let c = front_align_center(Vec2::new(-8.0, 8.0), Vec2::Y, half, true);
        assert!((c - Vec2::new(-16.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_edge_slide_against_right_edge() {
        let e = Entity::from_raw(1);
        let snapshot = neighbor_snapshot(e);
        let cp = run(Vec3::new(17.0, 0.0, 2.0), Quat::IDENTITY, &snapshot, &[], true, false)
            .expect("slides against edge");
        assert!((cp.position.xz() - Vec2::new(16.0, 2.0)).length() < 1e-4, "{:?}", cp.position);
        assert!((cp.direction - Vec2::Y).length() < 1e-4);
        assert_eq!(cp.source, SnapSource::ParcelEdge);
    }

    #[test]
    fn test_edge_slide_corrects_skewed_facing() {
        let e = Entity::from_raw(1);
        let snapshot = neighbor_snapshot(e);
        let skewed = Quat::from_rotation_y(10f32.to_radians());
        let cp = run(Vec3::new(17.0, 0.0, 2.0), skewed, &snapshot, &[], true, false)
            .expect("slides against edge");
        assert!(heading(cp.direction).abs() < 1e-4);
    }

    #[test]
    fn test_front_align_outranks_edge() {
        let e = Entity::from_raw(1);
        let snapshot = neighbor_snapshot(e);
        let cp = run(Vec3::new(17.0, 0.0, 2.0), Quat::IDENTITY, &snapshot, &[], true, true)
            .expect("locks onto corner");
        assert_eq!(cp.source, SnapSource::FrontAlign);
        assert_eq!(cp.snap_priority.level, SNAP_LEVEL_FRONT_ALIGN);
        assert!((cp.position.xz() - Vec2::new(16.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_excluded_parcel_ignored() {
        let e = Entity::from_raw(1);
        let snapshot = neighbor_snapshot(e);
        assert!(run(Vec3::new(17.0, 0.0, 2.0), Quat::IDENTITY, &snapshot, &[e], true, true).is_none());
    }

    #[test]
    fn test_front_align_radius() {
        let e = Entity::from_raw(1);
        let snapshot = neighbor_snapshot(e);
        assert!(run(Vec3::new(60.0, 0.0, 0.0), Quat::IDENTITY, &snapshot, &[], false, true).is_none());
    }
}
