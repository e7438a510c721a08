//! Road-side snapping: put the parcel's front against the nearest side curve
//! of a road edge, or against the rim of a free-standing node.

use bevy::prelude::*;

use super::{SnapCandidateGenerator, SnapContext};
use crate::components::{NetComposition, NodeGeometry, Segment};
use crate::config::{MAX_SNAP_CURVES, MIN_NODE_CURVE_LENGTH, SNAP_LEVEL_ROAD_SIDE};
use crate::control_point::{ControlPoint, SnapPriority, SnapSource};
use crate::geometry::{left_of, right_of, Bezier, Bounds2};
use crate::lookup::{EdgeData, NetElement, NodeData, SnapGeometry};
use crate::terrain::HeightSampler;

/// Which side of the road a snap curve bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveSide {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapCurve {
    pub bezier: Bezier,
    pub side: CurveSide,
}

impl SnapCurve {
    fn left(bezier: Bezier) -> Option<Self> {
        Some(Self {
            bezier,
            side: CurveSide::Left,
        })
    }

    fn right(bezier: Bezier) -> Option<Self> {
        Some(Self {
            bezier,
            side: CurveSide::Right,
        })
    }

    /// Lot forward direction at parameter `t`: across the curve, towards the
    /// road.
    pub fn facing(&self, t: f32) -> Option<Vec2> {
        let tangent = self.bezier.tangent(t).xz().normalize_or_zero();
        if tangent == Vec2::ZERO {
            return None;
        }
        Some(match self.side {
            CurveSide::Left => right_of(tangent),
            CurveSide::Right => left_of(tangent),
        })
    }
}

fn push_node_curves(
    curves: &mut [Option<SnapCurve>; MAX_SNAP_CURVES],
    base: usize,
    node: &NodeGeometry,
    multiply_connected: bool,
) {
    let usable = |segment: &Segment| segment.length.x > MIN_NODE_CURVE_LENGTH;
    if usable(&node.left) {
        curves[base] = SnapCurve::left(node.left.left);
        curves[base + 1] = SnapCurve::left(node.left.right);
    }
    if usable(&node.right) {
        curves[base + 2] = SnapCurve::right(node.right.left);
        curves[base + 3] = SnapCurve::right(node.right.right);
    }
    // The middle of a shared node belongs to the junction, not to this edge.
    if usable(&node.middle) && !multiply_connected {
        curves[base + 4] = SnapCurve::left(node.middle.left);
        curves[base + 5] = SnapCurve::right(node.middle.right);
    }
}

/// Every curve of `edge` a lot front may rest against, in a fixed order:
/// the four edge sides, then the start node's six slots, then the end
/// node's. Empty slots are `None`.
pub fn gather_snap_curves(edge: &EdgeData) -> [Option<SnapCurve>; MAX_SNAP_CURVES] {
    let mut curves = [None; MAX_SNAP_CURVES];
    curves[0] = SnapCurve::left(edge.geometry.start.left);
    curves[1] = SnapCurve::right(edge.geometry.start.right);
    curves[2] = SnapCurve::left(edge.geometry.end.left);
    curves[3] = SnapCurve::right(edge.geometry.end.right);
    push_node_curves(&mut curves, 4, &edge.start_node, edge.start_connections > 1);
    push_node_curves(&mut curves, 10, &edge.end_node, edge.end_connections > 1);
    curves
}

pub struct RoadSideGenerator<'a, G, H> {
    ctx: &'a SnapContext<'a>,
    geometry: &'a G,
    heights: &'a H,
    radius: f32,
    best_distance: f32,
    best: Option<ControlPoint>,
}

impl<'a, G: SnapGeometry, H: HeightSampler> RoadSideGenerator<'a, G, H> {
    pub fn new(ctx: &'a SnapContext<'a>, geometry: &'a G, heights: &'a H, radius: f32) -> Self {
        Self {
            ctx,
            geometry,
            heights,
            radius,
            best_distance: radius,
            best: None,
        }
    }

    fn accepts(&self, composition: &NetComposition, point: Vec3) -> bool {
        if !composition.layers.intersects(self.ctx.layers) {
            return false;
        }
        if composition.floating {
            return true;
        }
        let ground = self.heights.sample_height(point) + self.ctx.control_point.elevation;
        let relative = point.y - ground;
        relative >= composition.height_range.x && relative <= composition.height_range.y
    }

    fn place(&self, entity: Entity, rim: Vec2, forward: Vec2, curve_position: f32) -> ControlPoint {
        let center = rim - forward * (self.ctx.footprint.half_depth() + self.ctx.setback);
        let priority = SnapPriority::from_offset(SNAP_LEVEL_ROAD_SIDE, (center - self.ctx.hit()).length());
        let mut cp = self
            .ctx
            .control_point
            .snapped(center, forward, priority, SnapSource::RoadSide, entity);
        cp.curve_position = curve_position;
        cp
    }

    fn visit_node(&mut self, entity: Entity, node: &NodeData) {
        // Nodes with attached edges are covered through those edges.
        if node.attached_edges > 0 {
            return;
        }
        if !self.accepts(&node.composition, node.position) {
            return;
        }
        let to_node = node.position.xz() - self.ctx.hit();
        let distance = to_node.length() - node.composition.half_width();
        if distance >= self.best_distance {
            return;
        }
        let mut forward = to_node.normalize_or_zero();
        if forward == Vec2::ZERO {
            forward = self.ctx.direction();
        }
        let rim = node.position.xz() - forward * node.composition.half_width();
        self.best_distance = distance;
        self.best = Some(self.place(entity, rim, forward, 0.0));
    }

    fn visit_edge(&mut self, entity: Entity, edge: &EdgeData) {
        let hit = self.ctx.hit();
        let (center_distance, t) = edge.curve.distance_xz(hit);
        if center_distance - edge.composition.half_width() > self.radius {
            return;
        }
        if !self.accepts(&edge.composition, edge.curve.position(t)) {
            return;
        }

        let mut closest: Option<(SnapCurve, f32, f32)> = None;
        for curve in gather_snap_curves(edge).into_iter().flatten() {
            let (distance, t) = curve.bezier.distance_xz(hit);
            if closest.map_or(true, |(_, best, _)| distance < best) {
                closest = Some((curve, distance, t));
            }
        }
        let Some((curve, distance, t)) = closest else {
            return;
        };
        if distance >= self.best_distance {
            return;
        }
        let Some(forward) = curve.facing(t) else {
            return;
        };
        self.best_distance = distance;
        self.best = Some(self.place(entity, curve.bezier.position(t).xz(), forward, t));
    }
}

impl<G: SnapGeometry, H: HeightSampler> SnapCandidateGenerator for RoadSideGenerator<'_, G, H> {
    fn search_bounds(&self) -> Bounds2 {
        Bounds2::around(self.ctx.hit(), self.radius)
    }

    fn visit(&mut self, _bounds: &Bounds2, entity: Entity) {
        match self.geometry.net(entity) {
            Some(NetElement::Edge(edge)) => self.visit_edge(entity, &edge),
            Some(NetElement::Node(node)) => self.visit_node(entity, &node),
            None => {}
        }
    }

    fn best_candidate(&self) -> Option<ControlPoint> {
        self.best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{EdgeGeometry, NetLayers};
    use crate::config::ROAD_SEARCH_PAD;
    use crate::footprint::ParcelFootprint;
    use crate::lookup::GeometrySnapshot;
    use crate::terrain::TerrainSurface;

    const HALF_WIDTH: f32 = 6.0;

    struct Road {
        snapshot: GeometrySnapshot,
        edge: Entity,
        start: Entity,
        end: Entity,
    }

    fn straight_road(from: Vec3, to: Vec3, composition: NetComposition) -> Road {
        let mut snapshot = GeometrySnapshot::default();
        let start = Entity::from_raw(1);
        let end = Entity::from_raw(2);
        let edge = Entity::from_raw(3);
        let dir = (to - from).xz().normalize();
        snapshot.insert_node(start, from, composition);
        snapshot.insert_node(end, to, composition);
        snapshot.insert_edge(
            edge,
            start,
            end,
            Bezier::line(from, to),
            EdgeGeometry::straight(from, to, HALF_WIDTH),
            NodeGeometry::dead_end(from, dir, HALF_WIDTH, false),
            NodeGeometry::dead_end(to, dir, HALF_WIDTH, true),
            composition,
        );
        Road {
            snapshot,
            edge,
            start,
            end,
        }
    }

    fn context(hit: Vec3, lot: IVec2, layers: NetLayers) -> SnapContext<'static> {
        SnapContext {
            control_point: ControlPoint::raw(hit, Quat::IDENTITY),
            footprint: ParcelFootprint::new(lot).expect("valid lot"),
            setback: 0.0,
            layers,
            exclude: &[],
        }
    }

    fn run(ctx: &SnapContext, snapshot: &GeometrySnapshot, entities: &[Entity]) -> Option<ControlPoint> {
        let terrain = TerrainSurface::default();
        let radius = ctx.footprint.half_depth() + ctx.setback + ROAD_SEARCH_PAD;
        let mut generator = RoadSideGenerator::new(ctx, snapshot, &terrain, radius);
        for e in entities {
            generator.visit(&Bounds2::around(Vec2::ZERO, 0.0), *e);
        }
        generator.best_candidate()
    }

    #[test]
    fn test_straight_edge_left_side() {
        let road = straight_road(Vec3::ZERO, Vec3::new(0.0, 0.0, 100.0), NetComposition::road(12.0));
        let ctx = context(Vec3::new(-20.0, 0.0, 30.0), IVec2::new(2, 4), NetLayers::ROAD);

        let cp = run(&ctx, &road.snapshot, &[road.edge]).expect("snaps to road");
        assert!((cp.position.xz() - Vec2::new(-22.0, 30.0)).length() < 1e-3, "{:?}", cp.position);
        assert!((cp.direction - Vec2::X).length() < 1e-4);
        assert_eq!(cp.source, SnapSource::RoadSide);
        assert_eq!(cp.original_entity, Some(road.edge));
    }

    #[test]
    fn test_straight_edge_right_side() {
        let road = straight_road(Vec3::ZERO, Vec3::new(0.0, 0.0, 100.0), NetComposition::road(12.0));
        let ctx = context(Vec3::new(20.0, 0.0, 30.0), IVec2::new(2, 4), NetLayers::ROAD);

        let cp = run(&ctx, &road.snapshot, &[road.edge]).expect("snaps to road");
        assert!((cp.position.xz() - Vec2::new(22.0, 30.0)).length() < 1e-3);
        assert!((cp.direction + Vec2::X).length() < 1e-4);
    }

    #[test]
    fn test_dead_end_cap_faces_road() {
        let road = straight_road(Vec3::ZERO, Vec3::new(0.0, 0.0, 100.0), NetComposition::road(12.0));
        let ctx = context(Vec3::new(0.0, 0.0, 120.0), IVec2::new(2, 2), NetLayers::ROAD);

        let cp = run(&ctx, &road.snapshot, &[road.edge]).expect("snaps to cap");
        assert!(cp.direction.y < 0.0, "should face back towards the road");
        assert!(cp.position.z > 100.0);
    }

    #[test]
    fn test_layer_mismatch_rejected() {
        let road = straight_road(Vec3::ZERO, Vec3::new(0.0, 0.0, 100.0), NetComposition::road(12.0));
        let ctx = context(Vec3::new(-20.0, 0.0, 30.0), IVec2::new(2, 4), NetLayers::TRAIN);
        assert!(run(&ctx, &road.snapshot, &[road.edge]).is_none());
    }

    #[test]
    fn test_elevated_edge_needs_floating() {
        let raised = Vec3::new(0.0, 20.0, 0.0);
        let road = straight_road(raised, raised + Vec3::new(0.0, 0.0, 100.0), NetComposition::road(12.0));
        let ctx = context(Vec3::new(-20.0, 0.0, 30.0), IVec2::new(2, 4), NetLayers::ROAD);
        assert!(run(&ctx, &road.snapshot, &[road.edge]).is_none());

        let bridge = NetComposition {
            floating: true,
            ..NetComposition::road(12.0)
        };
        let road = straight_road(raised, raised + Vec3::new(0.0, 0.0, 100.0), bridge);
        assert!(run(&ctx, &road.snapshot, &[road.edge]).is_some());
    }

    #[test]
    fn test_connected_nodes_skipped() {
        let road = straight_road(Vec3::ZERO, Vec3::new(0.0, 0.0, 100.0), NetComposition::road(12.0));
        let ctx = context(Vec3::new(0.0, 0.0, -14.0), IVec2::new(2, 2), NetLayers::ROAD);
        assert!(run(&ctx, &road.snapshot, &[road.start, road.end]).is_none());
    }

    #[test]
    fn test_free_node_rim() {
        let mut snapshot = GeometrySnapshot::default();
        let node = Entity::from_raw(1);
        snapshot.insert_node(node, Vec3::ZERO, NetComposition::road(12.0));
        let ctx = context(Vec3::new(0.0, 0.0, 20.0), IVec2::new(2, 2), NetLayers::ROAD);

        let cp = run(&ctx, &snapshot, &[node]).expect("snaps to node");
        assert!((cp.position.xz() - Vec2::new(0.0, 14.0)).length() < 1e-4);
        assert!((cp.direction + Vec2::Y).length() < 1e-5);
    }

    #[test]
    fn test_middle_curves_dropped_at_shared_node() {
        let road = straight_road(Vec3::ZERO, Vec3::new(0.0, 0.0, 100.0), NetComposition::road(12.0));
        let Some(NetElement::Edge(mut edge)) = road.snapshot.net(road.edge) else {
            panic!("edge missing");
        };
        let wide = Segment::new(
            Bezier::line(Vec3::new(-6.0, 0.0, 100.0), Vec3::new(6.0, 0.0, 100.0)),
            Bezier::line(Vec3::new(6.0, 0.0, 100.0), Vec3::new(-6.0, 0.0, 100.0)),
        );
        edge.end_node.middle = wide;

        edge.end_connections = 1;
        assert!(gather_snap_curves(&edge)[14].is_some());
        edge.end_connections = 3;
        let curves = gather_snap_curves(&edge);
        assert!(curves[14].is_none());
        assert!(curves[15].is_none());
        // Edge sides are always present.
        assert!(curves[..4].iter().all(Option::is_some));
    }

    #[test]
    fn test_curve_order_and_sides() {
        let road = straight_road(Vec3::ZERO, Vec3::new(0.0, 0.0, 100.0), NetComposition::road(12.0));
        let Some(NetElement::Edge(edge)) = road.snapshot.net(road.edge) else {
            panic!("edge missing");
        };
        let curves = gather_snap_curves(&edge);
        let sides: Vec<_> = curves.iter().flatten().map(|c| c.side).collect();
        assert_eq!(
            sides,
            vec![
                CurveSide::Left,
                CurveSide::Right,
                CurveSide::Left,
                CurveSide::Right,
                CurveSide::Left,
                CurveSide::Left,
                CurveSide::Right,
                CurveSide::Right,
                CurveSide::Left,
                CurveSide::Left,
                CurveSide::Right,
                CurveSide::Right,
            ]
        );
    }
}
