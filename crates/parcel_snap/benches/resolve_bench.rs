//! Criterion benchmarks for snap resolution.
//!
//! Benchmarks:
//!   - one resolve per mode over a 16x16 street grid
//!   - resolve with all modes as the grid grows (4, 16, 32 cells a side)
//!   - building the 32x32 grid scene
//!
//! Hit points come from a seeded `ChaCha8Rng`, so every run resolves the same
//! placements.
//!
//! Run with: cargo bench -p parcel_snap --bench resolve_bench --features bench

use bevy::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use parcel_snap::scene::{street_grid, SnapScene};
use parcel_snap::{ControlPoint, PlacementRequest, SnapModes, SnapSettings};

const SPACING: f32 = 96.0;
const REQUESTS: usize = 256;

fn sample_requests(cells: u32) -> Vec<PlacementRequest<'static>> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let extent = cells as f32 * SPACING;
    (0..REQUESTS)
        .map(|_| {
            let hit = Vec3::new(rng.gen_range(0.0..extent), 0.0, rng.gen_range(0.0..extent));
            let yaw = rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI);
            let lot = IVec2::new(rng.gen_range(1..5), rng.gen_range(1..5));
            PlacementRequest::new(ControlPoint::raw(hit, Quat::from_rotation_y(yaw)), lot)
        })
        .collect()
}

fn resolve_all(scene: &SnapScene, requests: &[PlacementRequest], settings: &SnapSettings) -> usize {
    requests
        .iter()
        .filter(|request| matches!(scene.resolve(request, settings), Ok(Some(_))))
        .count()
}

// ---------------------------------------------------------------------------
// Benchmark: per mode
// ---------------------------------------------------------------------------

fn bench_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_mode");
    group.sample_size(50);

    let scene = street_grid(16, SPACING);
    let requests = sample_requests(16);

    for (name, modes) in [
        ("zone_side", SnapModes::ZONE_SIDE),
        ("road_side", SnapModes::ROAD_SIDE),
        ("parcel_edge", SnapModes::PARCEL_EDGE),
        ("front_align", SnapModes::PARCEL_FRONT_ALIGN),
        ("all", SnapModes::ALL),
    ] {
        let settings = SnapSettings::with_modes(modes);
        group.bench_function(name, |b| {
            b.iter(|| black_box(resolve_all(&scene, black_box(&requests), &settings)));
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: scene size
// ---------------------------------------------------------------------------

fn bench_scene_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_scene_size");
    group.sample_size(20);

    let settings = SnapSettings::default();
    for cells in [4u32, 16, 32] {
        let scene = street_grid(cells, SPACING);
        let requests = sample_requests(cells);
        group.bench_with_input(BenchmarkId::from_parameter(cells), &cells, |b, _| {
            b.iter(|| black_box(resolve_all(&scene, black_box(&requests), &settings)));
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: scene build
// ---------------------------------------------------------------------------

fn bench_scene_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("scene_build");
    group.sample_size(20);

    // Node merging and cap refresh plus every index insert.
    group.bench_function("street_grid_32", |b| {
        b.iter(|| black_box(street_grid(black_box(32), SPACING).indexes().nets.len()));
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Register groups
// ---------------------------------------------------------------------------

criterion_group!(benches, bench_modes, bench_scene_size, bench_scene_build);
criterion_main!(benches);
