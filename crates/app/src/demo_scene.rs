use bevy::prelude::*;

use parcel_snap::components::{
    ConnectedEdges, EdgeGeometry, EndNodeGeometry, NetComposition, NetCurve, NetEdge, NetNode,
    NodeGeometry, Parcel, StartNodeGeometry, ZoneBlock,
};
use parcel_snap::config::TERRAIN_HEIGHT_SCALE;
use parcel_snap::geometry::{direction_to_rotation, Bezier};
use parcel_snap::scene::SnapScene;
use parcel_snap::terrain::TerrainSurface;
use parcel_snap::{ControlPoint, PlacementRequest};

const ROAD_FROM: Vec3 = Vec3::new(-80.0, 0.0, 40.0);
const ROAD_TO: Vec3 = Vec3::new(80.0, 0.0, 40.0);
const ROAD_WIDTH: f32 = 12.0;

const BLOCK_POSITION: Vec3 = Vec3::new(0.0, 0.0, 18.0);
const BLOCK_SIZE: IVec2 = IVec2::new(10, 4);

const PARCEL_POSITION: Vec3 = Vec3::new(56.0, 0.0, 26.0);
const PARCEL_LOT: IVec2 = IVec2::new(2, 2);

/// Road that tolerates any terrain height, so the demo snaps with or
/// without generated terrain.
fn demo_road() -> NetComposition {
    NetComposition {
        height_range: Vec2::new(-TERRAIN_HEIGHT_SCALE, TERRAIN_HEIGHT_SCALE),
        ..NetComposition::road(ROAD_WIDTH)
    }
}

pub fn build_snapshot(terrain_seed: Option<i32>) -> SnapScene {
    let terrain = terrain_seed.map_or_else(TerrainSurface::default, TerrainSurface::noise);
    let mut scene = SnapScene::default().with_terrain(terrain);
    scene.add_road(ROAD_FROM, ROAD_TO, demo_road());
    scene.add_block(BLOCK_POSITION, Vec2::Y, BLOCK_SIZE);
    scene.add_parcel(PARCEL_POSITION, Vec2::Y, PARCEL_LOT);
    scene
}

pub fn sample_requests() -> Vec<(&'static str, PlacementRequest<'static>)> {
    let lot = IVec2::new(2, 2);
    let request = |x: f32, z: f32, rotation: Quat| {
        PlacementRequest::new(ControlPoint::raw(Vec3::new(x, 0.0, z), rotation), lot)
    };
    vec![
        ("near block front", request(3.0, 28.0, Quat::IDENTITY)),
        ("beside parcel", request(74.0, 28.0, Quat::IDENTITY)),
        ("across the road", request(10.0, 60.0, Quat::from_rotation_y(std::f32::consts::PI))),
        ("open field", request(0.0, -200.0, Quat::IDENTITY)),
    ]
}

/// Spawn the demo scene as ECS entities.
pub fn spawn_world(world: &mut World) {
    let composition = demo_road();
    let half_width = composition.half_width();
    let dir = (ROAD_TO - ROAD_FROM).xz().normalize();

    let start = world
        .spawn((NetNode { position: ROAD_FROM }, composition))
        .id();
    let end = world
        .spawn((NetNode { position: ROAD_TO }, composition))
        .id();
    let edge = world
        .spawn((
            NetEdge { start, end },
            NetCurve {
                bezier: Bezier::line(ROAD_FROM, ROAD_TO),
            },
            EdgeGeometry::straight(ROAD_FROM, ROAD_TO, half_width),
            StartNodeGeometry(NodeGeometry::dead_end(ROAD_FROM, dir, half_width, false)),
            EndNodeGeometry(NodeGeometry::dead_end(ROAD_TO, dir, half_width, true)),
            composition,
        ))
        .id();
    world.entity_mut(start).insert(ConnectedEdges(vec![edge]));
    world.entity_mut(end).insert(ConnectedEdges(vec![edge]));

    world.spawn(ZoneBlock {
        position: BLOCK_POSITION,
        direction: Vec2::Y,
        size: BLOCK_SIZE,
    });
    world.spawn((
        Parcel {
            lot_size: PARCEL_LOT,
        },
        Transform::from_translation(PARCEL_POSITION)
            .with_rotation(direction_to_rotation(Vec2::Y)),
    ));
}
