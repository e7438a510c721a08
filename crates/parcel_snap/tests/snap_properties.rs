//! Property-style checks over the headless resolver.
//!
//! Hit points are drawn from a seeded `ChaCha8Rng` so failures reproduce.
//!
//! Run: cargo test -p parcel_snap --test snap_properties

use std::f32::consts::PI;

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use parcel_snap::config::{SNAP_LEVEL_FRONT_ALIGN, SNAP_LEVEL_NONE};
use parcel_snap::generators::{align_facing, classify_relation, EdgeRelation};
use parcel_snap::geometry::rotate_direction;
use parcel_snap::scene::SnapScene;
use parcel_snap::{ControlPoint, PlacementRequest, SnapModes, SnapSettings, SnapSource};

const SEED: u64 = 0x5eed_cafe;
const SAMPLES: usize = 200;

fn rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(SEED)
}

fn request(hit: Vec3, rotation: Quat, lot: IVec2) -> PlacementRequest<'static> {
    PlacementRequest::new(ControlPoint::raw(hit, rotation), lot)
}

fn resolve(scene: &SnapScene, request: &PlacementRequest, modes: SnapModes) -> Option<ControlPoint> {
    scene
        .resolve(request, &SnapSettings::with_modes(modes))
        .expect("valid request")
}

/// Feed a result back in as the raw placement.
fn resnap(scene: &SnapScene, first: &ControlPoint, lot: IVec2, modes: SnapModes) -> ControlPoint {
    let again = request(first.position, first.rotation, lot);
    resolve(scene, &again, modes).expect("snapped placement snaps again")
}

fn assert_same_placement(a: &ControlPoint, b: &ControlPoint) {
    assert!(
        (a.position.xz() - b.position.xz()).length() < 1e-3,
        "{} vs {}",
        a.position,
        b.position
    );
    assert!(
        (a.direction - b.direction).length() < 1e-4,
        "{} vs {}",
        a.direction,
        b.direction
    );
    assert_eq!(a.source, b.source);
}

fn mixed_scene() -> SnapScene {
    let mut scene = SnapScene::default();
    scene.add_straight_road(Vec3::new(-120.0, 0.0, 40.0), Vec3::new(120.0, 0.0, 40.0), 12.0);
    scene.add_block(Vec3::new(0.0, 0.0, 18.0), Vec2::Y, IVec2::new(10, 4));
    scene.add_parcel(Vec3::new(56.0, 0.0, 26.0), Vec2::Y, IVec2::new(2, 2));
    scene
}

// ---------------------------------------------------------------------------
// No-op and priority
// ---------------------------------------------------------------------------

#[test]
fn test_no_modes_never_snaps() {
    let scene = mixed_scene();
    let mut rng = rng();
    for _ in 0..SAMPLES {
        let hit = Vec3::new(rng.gen_range(-100.0..100.0), 0.0, rng.gen_range(-20.0..80.0));
        let req = request(hit, Quat::from_rotation_y(rng.gen_range(-PI..PI)), IVec2::new(2, 3));
        assert!(resolve(&scene, &req, SnapModes::NONE).is_none());
    }
}

#[test]
fn test_all_modes_at_least_as_good_as_each() {
    let scene = mixed_scene();
    let mut rng = rng();
    let singles = [
        SnapModes::ZONE_SIDE,
        SnapModes::ROAD_SIDE,
        SnapModes::PARCEL_EDGE,
        SnapModes::PARCEL_FRONT_ALIGN,
    ];
    for _ in 0..SAMPLES {
        let hit = Vec3::new(rng.gen_range(-100.0..100.0), 0.0, rng.gen_range(-20.0..80.0));
        let lot = IVec2::new(rng.gen_range(1..5), rng.gen_range(1..5));
        let req = request(hit, Quat::from_rotation_y(rng.gen_range(-PI..PI)), lot);

        let combined = resolve(&scene, &req, SnapModes::ALL);
        let combined_level = combined.map_or(SNAP_LEVEL_NONE, |cp| cp.snap_priority.level);
        for modes in singles {
            if let Some(single) = resolve(&scene, &req, modes) {
                let best = combined.expect("combined snaps whenever a single mode does");
                assert!(
                    !single.snap_priority.is_higher_than(&best.snap_priority),
                    "{modes:?} beat the combined result at {hit}"
                );
                assert!(combined_level >= single.snap_priority.level);
            }
        }
    }
}

#[test]
fn test_snapped_result_is_strictly_better() {
    let scene = mixed_scene();
    let mut rng = rng();
    for _ in 0..SAMPLES {
        let hit = Vec3::new(rng.gen_range(-100.0..100.0), 0.0, rng.gen_range(-20.0..80.0));
        let req = request(hit, Quat::IDENTITY, IVec2::new(2, 2));
        if let Some(cp) = resolve(&scene, &req, SnapModes::ALL) {
            assert!(cp.snap_priority.is_snapped());
            assert!(cp.original_entity.is_some());
            assert_ne!(cp.source, SnapSource::None);
            assert_eq!(cp.hit_position, hit);
        }
    }
}

// ---------------------------------------------------------------------------
// Idempotence per generator
// ---------------------------------------------------------------------------

#[test]
fn test_zone_side_idempotent() {
    let mut scene = SnapScene::default();
    scene.add_block(Vec3::ZERO, Vec2::Y, IVec2::new(10, 4));
    let mut rng = rng();
    for _ in 0..SAMPLES {
        let lot = IVec2::new(rng.gen_range(1..5), rng.gen_range(1..5));
        let hit = Vec3::new(rng.gen_range(-30.0..30.0), 0.0, rng.gen_range(14.0..22.0));
        let first = resolve(&scene, &request(hit, Quat::IDENTITY, lot), SnapModes::ZONE_SIDE)
            .expect("hit near the block front snaps");
        let second = resnap(&scene, &first, lot, SnapModes::ZONE_SIDE);
        assert_same_placement(&first, &second);
    }
}

#[test]
fn test_road_side_idempotent() {
    let mut scene = SnapScene::default();
    scene.add_straight_road(Vec3::new(-100.0, 0.0, 0.0), Vec3::new(100.0, 0.0, 0.0), 12.0);
    let mut rng = rng();
    for _ in 0..SAMPLES {
        let lot = IVec2::new(rng.gen_range(1..5), rng.gen_range(1..5));
        let hit = Vec3::new(rng.gen_range(-60.0..60.0), 0.0, rng.gen_range(10.0..25.0));
        let first = resolve(&scene, &request(hit, Quat::IDENTITY, lot), SnapModes::ROAD_SIDE)
            .expect("hit beside the road snaps");
        // Left side of a +X road is +Z; the lot faces back at the road.
        assert!((first.direction + Vec2::Y).length() < 1e-4);
        assert!((first.position.z - (6.0 + lot.y as f32 * 4.0)).abs() < 1e-3);
        let second = resnap(&scene, &first, lot, SnapModes::ROAD_SIDE);
        assert_same_placement(&first, &second);
    }
}

#[test]
fn test_parcel_edge_idempotent() {
    let mut scene = SnapScene::default();
    scene.add_parcel(Vec3::ZERO, Vec2::Y, IVec2::new(2, 2));
    let lot = IVec2::new(2, 2);
    let mut rng = rng();
    for _ in 0..SAMPLES {
        let hit = Vec3::new(rng.gen_range(14.0..22.0), 0.0, rng.gen_range(-6.0..6.0));
        let yaw = rng.gen_range(-0.3..0.3);
        let first = resolve(
            &scene,
            &request(hit, Quat::from_rotation_y(yaw), lot),
            SnapModes::PARCEL_EDGE,
        )
        .expect("hit beside the parcel snaps");
        assert!((first.position.x - 16.0).abs() < 1e-3);
        let second = resnap(&scene, &first, lot, SnapModes::PARCEL_EDGE);
        assert_same_placement(&first, &second);
    }
}

#[test]
fn test_all_modes_idempotent() {
    // Road-side results land half a lot deep off the road, inside reach of
    // the block front and the placed parcel.
    let scene = mixed_scene();
    let mut rng = rng();
    let mut snapped = 0;
    for _ in 0..SAMPLES {
        let hit = Vec3::new(rng.gen_range(-100.0..100.0), 0.0, rng.gen_range(-20.0..80.0));
        let lot = IVec2::new(rng.gen_range(1..5), rng.gen_range(1..5));
        let req = request(hit, Quat::from_rotation_y(rng.gen_range(-PI..PI)), lot);
        let Some(first) = resolve(&scene, &req, SnapModes::ALL) else {
            continue;
        };
        snapped += 1;
        let second = resnap(&scene, &first, lot, SnapModes::ALL);
        assert_same_placement(&first, &second);
    }
    assert!(snapped > SAMPLES / 4, "only {snapped} hits snapped");
}

// ---------------------------------------------------------------------------
// Worked cases
// ---------------------------------------------------------------------------

#[test]
fn test_zone_parity_six_and_seven() {
    let mut scene = SnapScene::default();
    scene.add_block(Vec3::ZERO, Vec2::Y, IVec2::new(6, 4));
    let hit = Vec3::new(1.0, 0.0, 10.0);

    let odd = resolve(&scene, &request(hit, Quat::IDENTITY, IVec2::new(7, 3)), SnapModes::ZONE_SIDE)
        .expect("snaps");
    assert!((odd.position.x - 4.0).abs() < 1e-4);

    let even = resolve(&scene, &request(hit, Quat::IDENTITY, IVec2::new(6, 3)), SnapModes::ZONE_SIDE)
        .expect("snaps");
    assert!(even.position.x.abs() < 1e-4);
}

#[test]
fn test_junction_node_never_chosen() {
    let mut scene = SnapScene::default();
    let center = Vec3::ZERO;
    let east = scene.add_straight_road(center, Vec3::new(80.0, 0.0, 0.0), 12.0);
    scene.add_straight_road(center, Vec3::new(-80.0, 0.0, 0.0), 12.0);
    scene.add_straight_road(center, Vec3::new(0.0, 0.0, 80.0), 12.0);
    let junction = scene
        .geometry()
        .edge_endpoints(east)
        .map(|(start, _)| start)
        .expect("edge endpoints");
    assert_eq!(scene.geometry().connected_edges(junction).len(), 3);

    let mut rng = rng();
    for _ in 0..SAMPLES {
        let hit = Vec3::new(rng.gen_range(-20.0..20.0), 0.0, rng.gen_range(-20.0..20.0));
        if let Some(cp) = resolve(&scene, &request(hit, Quat::IDENTITY, IVec2::new(2, 2)), SnapModes::ROAD_SIDE) {
            assert_ne!(cp.original_entity, Some(junction));
            assert_eq!(cp.source, SnapSource::RoadSide);
        }
    }
}

#[test]
fn test_right_angle_residual_47() {
    let normal = Vec2::new(0.6, 0.8);
    let facing = rotate_direction(normal, 47f32.to_radians());
    let (corrected, residual) = align_facing(normal, facing);
    assert!((residual.to_degrees() + 43.0).abs() < 1e-3);
    assert!(classify_relation(normal, corrected).is_some());
    assert_eq!(
        classify_relation(normal, rotate_direction(normal, PI / 2.0)),
        Some(EdgeRelation::Right)
    );
}

#[test]
fn test_front_align_glues_corners() {
    let mut scene = SnapScene::default();
    scene.add_parcel(Vec3::ZERO, Vec2::Y, IVec2::new(2, 2));

    let right = resolve(&scene, &request(Vec3::new(17.0, 0.0, 1.0), Quat::IDENTITY, IVec2::new(2, 2)), SnapModes::ALL)
        .expect("snaps");
    assert_eq!(right.snap_priority.level, SNAP_LEVEL_FRONT_ALIGN);
    assert!((right.position.xz() - Vec2::new(16.0, 0.0)).length() < 1e-4);

    // A deeper lot keeps its front on the neighbor's front line.
    let left = resolve(&scene, &request(Vec3::new(-18.0, 0.0, -4.0), Quat::IDENTITY, IVec2::new(3, 4)), SnapModes::PARCEL_FRONT_ALIGN)
        .expect("snaps");
    assert!((left.position.xz() - Vec2::new(-20.0, -8.0)).length() < 1e-4);
}
