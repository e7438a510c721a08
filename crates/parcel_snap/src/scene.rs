//! Headless snap scene: geometry snapshot plus indexes, without a `World`.
//!
//! Used by the demo binary, benches and tests to resolve placements against
//! hand-built blocks, parcels and roads.

use bevy::prelude::*;

use crate::components::{EdgeGeometry, NetComposition, NodeGeometry, ZoneBlock};
use crate::control_point::ControlPoint;
use crate::error::SnapError;
use crate::geometry::{direction_to_rotation, Bezier};
use crate::indexes::{block_bounds, edge_bounds, node_bounds, parcel_bounds, SnapIndexes};
use crate::lookup::{GeometrySnapshot, NetElement, ParcelData, SnapGeometry};
use crate::resolver::{resolve_snap, PlacementRequest};
use crate::settings::SnapSettings;
use crate::terrain::TerrainSurface;

/// Road endpoints closer than this share a node.
const NODE_MERGE_DISTANCE: f32 = 0.5;

#[derive(Default)]
pub struct SnapScene {
    geometry: GeometrySnapshot,
    indexes: SnapIndexes,
    terrain: TerrainSurface,
    /// Node entities in creation order, for endpoint merging.
    nodes: Vec<Entity>,
    next_id: u32,
}

impl SnapScene {
    pub fn with_terrain(mut self, terrain: TerrainSurface) -> Self {
        self.terrain = terrain;
        self
    }

    pub fn geometry(&self) -> &GeometrySnapshot {
        &self.geometry
    }

    pub fn indexes(&self) -> &SnapIndexes {
        &self.indexes
    }

    pub fn terrain(&self) -> &TerrainSurface {
        &self.terrain
    }

    fn allocate(&mut self) -> Entity {
        self.next_id += 1;
        Entity::from_raw(self.next_id)
    }

    pub fn add_block(&mut self, position: Vec3, direction: Vec2, size: IVec2) -> Entity {
        let entity = self.allocate();
        let block = ZoneBlock {
            position,
            direction: direction.normalize_or_zero(),
            size,
        };
        self.geometry.insert_block(entity, block, false);
        self.indexes.blocks.insert(entity, block_bounds(&block));
        entity
    }

    /// Mark a block as owned by a parcel.
    pub fn set_block_owned(&mut self, entity: Entity, owned: bool) {
        if let Some(data) = self.geometry.block(entity) {
            self.geometry.insert_block(entity, data.block, owned);
        }
    }

    pub fn add_parcel(&mut self, position: Vec3, direction: Vec2, lot_size: IVec2) -> Entity {
        let entity = self.allocate();
        let rotation = direction_to_rotation(direction);
        self.geometry.insert_parcel(
            entity,
            ParcelData {
                position,
                rotation,
                lot_size,
            },
        );
        self.indexes
            .parcels
            .insert(entity, parcel_bounds(position, rotation, lot_size));
        entity
    }

    /// Free-standing node with no edges.
    pub fn add_node(&mut self, position: Vec3, composition: NetComposition) -> Entity {
        let entity = self.allocate();
        self.geometry.insert_node(entity, position, composition);
        self.indexes
            .nets
            .insert(entity, node_bounds(position, &composition));
        self.nodes.push(entity);
        entity
    }

    fn find_or_create_node(&mut self, position: Vec3, composition: NetComposition) -> Entity {
        let existing = self.nodes.iter().copied().find(|node| {
            self.geometry
                .node_position(*node)
                .is_some_and(|p| (p - position).length() < NODE_MERGE_DISTANCE)
        });
        match existing {
            Some(node) => node,
            None => self.add_node(position, composition),
        }
    }

    /// Straight road of full `width` between two points. Endpoints merge
    /// with existing nodes; dead ends get rounded caps.
    pub fn add_straight_road(&mut self, from: Vec3, to: Vec3, width: f32) -> Entity {
        self.add_road(from, to, NetComposition::road(width))
    }

    pub fn add_road(&mut self, from: Vec3, to: Vec3, composition: NetComposition) -> Entity {
        let start = self.find_or_create_node(from, composition);
        let end = self.find_or_create_node(to, composition);
        let from = self.geometry.node_position(start).unwrap_or(from);
        let to = self.geometry.node_position(end).unwrap_or(to);

        let entity = self.allocate();
        let half_width = composition.half_width();
        let dir = (to - from).xz().normalize_or_zero();
        self.geometry.insert_edge(
            entity,
            start,
            end,
            Bezier::line(from, to),
            EdgeGeometry::straight(from, to, half_width),
            NodeGeometry::dead_end(from, dir, half_width, false),
            NodeGeometry::dead_end(to, dir, half_width, true),
            composition,
        );
        self.refresh_caps(start);
        self.refresh_caps(end);
        entity
    }

    /// Rebuild the cap geometry of every edge at `node` and re-index them.
    fn refresh_caps(&mut self, node: Entity) {
        let edges = self.geometry.connected_edges(node).to_vec();
        for edge in edges {
            let Some((start, end)) = self.geometry.edge_endpoints(edge) else {
                continue;
            };
            let (Some(from), Some(to)) = (
                self.geometry.node_position(start),
                self.geometry.node_position(end),
            ) else {
                continue;
            };
            let Some(NetElement::Edge(data)) = self.geometry.net(edge) else {
                continue;
            };
            let dir = (to - from).xz().normalize_or_zero();
            let half_width = data.composition.half_width();
            let cap = |position: Vec3, node: Entity, at_end: bool| {
                if self.geometry.connected_edges(node).len() > 1 {
                    NodeGeometry::junction(position)
                } else {
                    NodeGeometry::dead_end(position, dir, half_width, at_end)
                }
            };
            let start_node = cap(from, start, false);
            let end_node = cap(to, end, true);
            self.geometry.set_node_geometry(edge, start_node, end_node);
            self.indexes
                .nets
                .insert(edge, edge_bounds(&data.geometry, &start_node, &end_node));
        }
    }

    pub fn remove(&mut self, entity: Entity) {
        self.geometry.remove(entity);
        self.indexes.blocks.remove(entity);
        self.indexes.nets.remove(entity);
        self.indexes.parcels.remove(entity);
        self.nodes.retain(|n| *n != entity);
    }

    pub fn resolve(
        &self,
        request: &PlacementRequest,
        settings: &SnapSettings,
    ) -> Result<Option<ControlPoint>, SnapError> {
        resolve_snap(request, settings, &self.indexes, &self.geometry, &self.terrain)
    }
}

/// Street grid for benchmarks and stress tests: `cells` by `cells` cells,
/// `spacing` apart, each with a zoning block along its south street and
/// every third with a placed parcel along its north street.
#[cfg(any(test, feature = "bench"))]
pub fn street_grid(cells: u32, spacing: f32) -> SnapScene {
    use crate::config::{CELL_SIZE, HALF_CELL};

    let mut scene = SnapScene::default();
    let extent = cells as f32 * spacing;
    for i in 0..=cells {
        let offset = i as f32 * spacing;
        scene.add_straight_road(Vec3::new(0.0, 0.0, offset), Vec3::new(extent, 0.0, offset), 12.0);
        scene.add_straight_road(Vec3::new(offset, 0.0, 0.0), Vec3::new(offset, 0.0, extent), 12.0);
    }
    let block_depth = ((spacing * 0.5 - 6.0) / CELL_SIZE).floor().max(1.0) as i32;
    let block_width = ((spacing - 12.0) / CELL_SIZE).floor().max(1.0) as i32;
    for x in 0..cells {
        for z in 0..cells {
            let origin = Vec2::new(x as f32, z as f32) * spacing;
            let front = origin.y + 6.0;
            let center_x = origin.x + spacing * 0.5;
            // Block faces the street at its south edge.
            let half_depth = block_depth as f32 * HALF_CELL;
            scene.add_block(
                Vec3::new(center_x, 0.0, front + half_depth),
                -Vec2::Y,
                IVec2::new(block_width, block_depth),
            );
            if (x + z) % 3 == 0 {
                scene.add_parcel(
                    Vec3::new(center_x, 0.0, origin.y + spacing - 6.0 - 8.0),
                    -Vec2::Y,
                    IVec2::new(2, 2),
                );
            }
        }
    }
    scene
}
