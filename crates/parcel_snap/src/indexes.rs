//! Spatial indexes over snap targets and the systems that keep them in sync
//! with the ECS.
//!
//! Each index stores entity ids with world-space XZ bounds. Sync systems
//! react to `Changed` components and `RemovedComponents`, so an idle frame
//! does not touch the resource.

use bevy::prelude::*;

use crate::components::{
    ConnectedEdges, EdgeGeometry, EndNodeGeometry, NetComposition, NetEdge, NetNode, NodeGeometry,
    Parcel, ParcelOwned, StartNodeGeometry, ZoneBlock,
};
use crate::config::HALF_CELL;
use crate::footprint::lot_corners;
use crate::geometry::{rotation_to_direction, Bounds2};
use crate::preview::{ParcelPreview, PreviewMember};
use crate::spatial_index::QuadTree;

#[derive(Resource, Default)]
pub struct SnapIndexes {
    pub blocks: QuadTree<Entity>,
    /// Nodes and edges share one index.
    pub nets: QuadTree<Entity>,
    pub parcels: QuadTree<Entity>,
}

impl SnapIndexes {
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.nets.clear();
        self.parcels.clear();
    }
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

pub fn block_bounds(block: &ZoneBlock) -> Bounds2 {
    block.bounds()
}

pub fn parcel_bounds(position: Vec3, rotation: Quat, lot_size: IVec2) -> Bounds2 {
    let forward = rotation_to_direction(rotation);
    Bounds2::from_points(&lot_corners(position.xz(), forward, lot_size.as_vec2() * HALF_CELL))
}

pub fn node_bounds(position: Vec3, composition: &NetComposition) -> Bounds2 {
    Bounds2::around(position.xz(), composition.half_width())
}

pub fn edge_bounds(geometry: &EdgeGeometry, start: &NodeGeometry, end: &NodeGeometry) -> Bounds2 {
    geometry.bounds().union(&start.bounds()).union(&end.bounds())
}

// ---------------------------------------------------------------------------
// Sync systems
// ---------------------------------------------------------------------------

/// Ownership does not move a block, but it decides whether the block is a
/// target, so it still counts as an index change.
pub fn sync_block_index(
    mut indexes: ResMut<SnapIndexes>,
    changed: Query<(Entity, &ZoneBlock), Changed<ZoneBlock>>,
    ownership: Query<(), (With<ZoneBlock>, Changed<ParcelOwned>)>,
    mut removed: RemovedComponents<ZoneBlock>,
    mut disowned: RemovedComponents<ParcelOwned>,
) {
    for entity in removed.read() {
        indexes.blocks.remove(entity);
    }
    for (entity, block) in &changed {
        indexes.blocks.insert(entity, block_bounds(block));
    }
    if !ownership.is_empty() || disowned.read().count() > 0 {
        indexes.set_changed();
    }
}

/// Placed parcels only; previews are never snap targets.
#[allow(clippy::type_complexity)]
pub fn sync_parcel_index(
    mut indexes: ResMut<SnapIndexes>,
    changed: Query<
        (Entity, &Parcel, &Transform),
        (
            Or<(Changed<Parcel>, Changed<Transform>)>,
            Without<ParcelPreview>,
            Without<PreviewMember>,
        ),
    >,
    mut removed: RemovedComponents<Parcel>,
) {
    for entity in removed.read() {
        indexes.parcels.remove(entity);
    }
    for (entity, parcel, transform) in &changed {
        let bounds = parcel_bounds(transform.translation, transform.rotation, parcel.lot_size);
        indexes.parcels.insert(entity, bounds);
    }
}

#[allow(clippy::type_complexity)]
pub fn sync_net_index(
    mut indexes: ResMut<SnapIndexes>,
    nodes: Query<
        (Entity, &NetNode, &NetComposition),
        Or<(Changed<NetNode>, Changed<NetComposition>)>,
    >,
    edges: Query<
        (Entity, &EdgeGeometry, &StartNodeGeometry, &EndNodeGeometry),
        (
            With<NetEdge>,
            Or<(
                Changed<EdgeGeometry>,
                Changed<StartNodeGeometry>,
                Changed<EndNodeGeometry>,
            )>,
        ),
    >,
    // Junction status and edge compositions gate candidates without
    // changing any bounds.
    connections: Query<(), (With<NetNode>, Changed<ConnectedEdges>)>,
    edge_compositions: Query<(), (With<NetEdge>, Changed<NetComposition>)>,
    mut removed_nodes: RemovedComponents<NetNode>,
    mut removed_edges: RemovedComponents<NetEdge>,
    mut removed_connections: RemovedComponents<ConnectedEdges>,
) {
    for entity in removed_nodes.read().chain(removed_edges.read()) {
        indexes.nets.remove(entity);
    }
    for (entity, node, composition) in &nodes {
        indexes.nets.insert(entity, node_bounds(node.position, composition));
    }
    for (entity, geometry, start, end) in &edges {
        indexes.nets.insert(entity, edge_bounds(geometry, &start.0, &end.0));
    }
    if !connections.is_empty()
        || !edge_compositions.is_empty()
        || removed_connections.read().count() > 0
    {
        indexes.set_changed();
    }
}
