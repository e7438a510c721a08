//! Candidate generators.
//!
//! Each generator walks one spatial index, keeps its own best candidate and
//! hands it to the arbiter once the walk is done. Generators only see the
//! shared [`SnapContext`] and never each other's results.

pub mod parcel_edge;
pub mod road_side;
pub mod zone_side;

pub use parcel_edge::{
    align_facing, classify_relation, front_align_center, EdgeRelation, ParcelEdgeGenerator,
};
pub use road_side::{gather_snap_curves, CurveSide, RoadSideGenerator, SnapCurve};
pub use zone_side::ZoneSideGenerator;

use bevy::prelude::*;

use crate::components::NetLayers;
use crate::control_point::ControlPoint;
use crate::footprint::ParcelFootprint;
use crate::geometry::Bounds2;
use crate::spatial_index::{QuadTree, SpatialVisitor};

/// Per-request inputs shared by every generator.
#[derive(Debug, Clone, Copy)]
pub struct SnapContext<'a> {
    /// Unsnapped baseline.
    pub control_point: ControlPoint,
    pub footprint: ParcelFootprint,
    pub setback: f32,
    /// Layers a road must share to be snapped to.
    pub layers: NetLayers,
    /// Entities that must never be snapped to (the preview itself).
    pub exclude: &'a [Entity],
}

impl SnapContext<'_> {
    pub fn hit(&self) -> Vec2 {
        self.control_point.hit_position.xz()
    }

    pub fn direction(&self) -> Vec2 {
        self.control_point.direction
    }

    pub fn is_excluded(&self, entity: Entity) -> bool {
        self.exclude.contains(&entity)
    }
}

/// A spatial-index walker that produces at most one candidate.
pub trait SnapCandidateGenerator {
    /// Area the generator cares about; index nodes outside it are pruned.
    fn search_bounds(&self) -> Bounds2;

    fn visit(&mut self, bounds: &Bounds2, entity: Entity);

    fn best_candidate(&self) -> Option<ControlPoint>;
}

struct GeneratorVisitor<'g, G> {
    search: Bounds2,
    generator: &'g mut G,
}

impl<G: SnapCandidateGenerator> SpatialVisitor<Entity> for GeneratorVisitor<'_, G> {
    fn intersect(&mut self, bounds: &Bounds2) -> bool {
        self.search.intersects(bounds)
    }

    fn visit(&mut self, bounds: &Bounds2, entity: Entity) {
        self.generator.visit(bounds, entity);
    }
}

/// Drive `generator` over `index` and return its best candidate.
pub fn run_generator<G: SnapCandidateGenerator>(
    index: &QuadTree<Entity>,
    mut generator: G,
) -> Option<ControlPoint> {
    let search = generator.search_bounds();
    index.iterate(&mut GeneratorVisitor {
        search,
        generator: &mut generator,
    });
    generator.best_candidate()
}
