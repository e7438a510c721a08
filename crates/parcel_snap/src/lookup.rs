//! Read-only geometry lookup keyed by entity.
//!
//! Generators receive entity ids from the spatial indexes and resolve them
//! through [`SnapGeometry`]. An id that no longer resolves (despawned, or a
//! component was removed since the index was synced) is skipped silently.
//!
//! Two implementations exist: [`EcsSnapGeometry`] reads the live `World`
//! through queries, and [`GeometrySnapshot`] holds owned copies for headless
//! use and tests.

use std::collections::HashMap;

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::components::{
    ConnectedEdges, EdgeGeometry, EndNodeGeometry, NetComposition, NetCurve, NetEdge, NetNode,
    NodeGeometry, Parcel, ParcelOwned, StartNodeGeometry, ZoneBlock,
};
use crate::config::HALF_CELL;
use crate::footprint::lot_corners;
use crate::geometry::{rotation_to_direction, Bezier};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockData {
    pub block: ZoneBlock,
    pub parcel_owned: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParcelData {
    pub position: Vec3,
    pub rotation: Quat,
    pub lot_size: IVec2,
}

impl ParcelData {
    pub fn forward(&self) -> Vec2 {
        rotation_to_direction(self.rotation)
    }

    pub fn half_extents(&self) -> Vec2 {
        self.lot_size.as_vec2() * HALF_CELL
    }

    /// Front-left, front-right, back-right, back-left.
    pub fn corners(&self) -> [Vec2; 4] {
        lot_corners(self.position.xz(), self.forward(), self.half_extents())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeData {
    pub position: Vec3,
    pub composition: NetComposition,
    /// Number of edges whose start or end is this node.
    pub attached_edges: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeData {
    pub curve: Bezier,
    pub geometry: EdgeGeometry,
    pub start_node: NodeGeometry,
    pub end_node: NodeGeometry,
    pub composition: NetComposition,
    /// Edge count at the start node, this edge included.
    pub start_connections: usize,
    pub end_connections: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NetElement {
    Node(NodeData),
    Edge(EdgeData),
}

/// Entity to geometry resolution used by every generator.
pub trait SnapGeometry {
    fn block(&self, entity: Entity) -> Option<BlockData>;
    fn parcel(&self, entity: Entity) -> Option<ParcelData>;
    fn net(&self, entity: Entity) -> Option<NetElement>;
}

// ---------------------------------------------------------------------------
// Live ECS lookup
// ---------------------------------------------------------------------------

/// Query bundle resolving geometry straight from the `World`. All access is
/// read-only, so it can be shared across a `par_iter_mut` over previews.
#[derive(SystemParam)]
pub struct EcsSnapGeometry<'w, 's> {
    blocks: Query<'w, 's, (&'static ZoneBlock, Has<ParcelOwned>)>,
    parcels: Query<'w, 's, (&'static Parcel, &'static Transform)>,
    nodes: Query<'w, 's, (&'static NetNode, &'static NetComposition, Option<&'static ConnectedEdges>)>,
    edges: Query<
        'w,
        's,
        (
            &'static NetEdge,
            &'static NetCurve,
            &'static EdgeGeometry,
            &'static StartNodeGeometry,
            &'static EndNodeGeometry,
            &'static NetComposition,
        ),
    >,
    edge_ends: Query<'w, 's, &'static NetEdge>,
}

impl EcsSnapGeometry<'_, '_> {
    fn connection_count(&self, node: Entity) -> usize {
        self.nodes
            .get(node)
            .ok()
            .and_then(|(_, _, connected)| connected)
            .map_or(0, |connected| connected.0.len())
    }

    fn attached_count(&self, node: Entity, connected: Option<&ConnectedEdges>) -> usize {
        connected.map_or(0, |connected| {
            connected
                .0
                .iter()
                .filter_map(|e| self.edge_ends.get(*e).ok())
                .filter(|edge| edge.start == node || edge.end == node)
                .count()
        })
    }
}

impl SnapGeometry for EcsSnapGeometry<'_, '_> {
    fn block(&self, entity: Entity) -> Option<BlockData> {
        let (block, parcel_owned) = self.blocks.get(entity).ok()?;
        Some(BlockData {
            block: *block,
            parcel_owned,
        })
    }

    fn parcel(&self, entity: Entity) -> Option<ParcelData> {
        let (parcel, transform) = self.parcels.get(entity).ok()?;
        Some(ParcelData {
            position: transform.translation,
            rotation: transform.rotation,
            lot_size: parcel.lot_size,
        })
    }

    fn net(&self, entity: Entity) -> Option<NetElement> {
        if let Ok((edge, curve, geometry, start, end, composition)) = self.edges.get(entity) {
            return Some(NetElement::Edge(EdgeData {
                curve: curve.bezier,
                geometry: *geometry,
                start_node: start.0,
                end_node: end.0,
                composition: *composition,
                start_connections: self.connection_count(edge.start),
                end_connections: self.connection_count(edge.end),
            }));
        }
        let (node, composition, connected) = self.nodes.get(entity).ok()?;
        Some(NetElement::Node(NodeData {
            position: node.position,
            composition: *composition,
            attached_edges: self.attached_count(entity, connected),
        }))
    }
}

// ---------------------------------------------------------------------------
// Owned snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct NodeRecord {
    position: Vec3,
    composition: NetComposition,
    connected: Vec<Entity>,
}

#[derive(Debug, Clone, Copy)]
struct EdgeRecord {
    start: Entity,
    end: Entity,
    curve: Bezier,
    geometry: EdgeGeometry,
    start_node: NodeGeometry,
    end_node: NodeGeometry,
    composition: NetComposition,
}

/// Owned copy of scene geometry, mirroring what [`EcsSnapGeometry`] reads.
#[derive(Debug, Clone, Default)]
pub struct GeometrySnapshot {
    blocks: HashMap<Entity, BlockData>,
    parcels: HashMap<Entity, ParcelData>,
    nodes: HashMap<Entity, NodeRecord>,
    edges: HashMap<Entity, EdgeRecord>,
}

impl GeometrySnapshot {
    pub fn insert_block(&mut self, entity: Entity, block: ZoneBlock, parcel_owned: bool) {
        self.blocks.insert(entity, BlockData { block, parcel_owned });
    }

    pub fn insert_parcel(&mut self, entity: Entity, parcel: ParcelData) {
        self.parcels.insert(entity, parcel);
    }

    pub fn insert_node(&mut self, entity: Entity, position: Vec3, composition: NetComposition) {
        self.nodes.insert(
            entity,
            NodeRecord {
                position,
                composition,
                connected: Vec::new(),
            },
        );
    }

    /// Register an edge and attach it to both endpoint nodes.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_edge(
        &mut self,
        entity: Entity,
        start: Entity,
        end: Entity,
        curve: Bezier,
        geometry: EdgeGeometry,
        start_node: NodeGeometry,
        end_node: NodeGeometry,
        composition: NetComposition,
    ) {
        self.edges.insert(
            entity,
            EdgeRecord {
                start,
                end,
                curve,
                geometry,
                start_node,
                end_node,
                composition,
            },
        );
        for node in [start, end] {
            if let Some(record) = self.nodes.get_mut(&node) {
                if !record.connected.contains(&entity) {
                    record.connected.push(entity);
                }
            }
        }
    }

    /// Replace the cap geometry of an existing edge.
    pub fn set_node_geometry(&mut self, edge: Entity, start_node: NodeGeometry, end_node: NodeGeometry) {
        if let Some(record) = self.edges.get_mut(&edge) {
            record.start_node = start_node;
            record.end_node = end_node;
        }
    }

    pub fn edge_endpoints(&self, edge: Entity) -> Option<(Entity, Entity)> {
        self.edges.get(&edge).map(|e| (e.start, e.end))
    }

    pub fn connected_edges(&self, node: Entity) -> &[Entity] {
        self.nodes
            .get(&node)
            .map_or(&[][..], |n| n.connected.as_slice())
    }

    pub fn node_position(&self, node: Entity) -> Option<Vec3> {
        self.nodes.get(&node).map(|n| n.position)
    }

    /// Drop an entity of any kind, detaching edges from their nodes.
    pub fn remove(&mut self, entity: Entity) {
        self.blocks.remove(&entity);
        self.parcels.remove(&entity);
        self.nodes.remove(&entity);
        if let Some(edge) = self.edges.remove(&entity) {
            for node in [edge.start, edge.end] {
                if let Some(record) = self.nodes.get_mut(&node) {
                    record.connected.retain(|e| *e != entity);
                }
            }
        }
    }
}

impl SnapGeometry for GeometrySnapshot {
    fn block(&self, entity: Entity) -> Option<BlockData> {
        self.blocks.get(&entity).copied()
    }

    fn parcel(&self, entity: Entity) -> Option<ParcelData> {
        self.parcels.get(&entity).copied()
    }

    fn net(&self, entity: Entity) -> Option<NetElement> {
        if let Some(edge) = self.edges.get(&entity) {
            return Some(NetElement::Edge(EdgeData {
                curve: edge.curve,
                geometry: edge.geometry,
                start_node: edge.start_node,
                end_node: edge.end_node,
                composition: edge.composition,
                start_connections: self.connected_edges(edge.start).len(),
                end_connections: self.connected_edges(edge.end).len(),
            }));
        }
        let node = self.nodes.get(&entity)?;
        let attached = node
            .connected
            .iter()
            .filter_map(|e| self.edges.get(e))
            .filter(|e| e.start == entity || e.end == entity)
            .count();
        Some(NetElement::Node(NodeData {
            position: node.position,
            composition: node.composition,
            attached_edges: attached,
        }))
    }
}
