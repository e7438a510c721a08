//! Headless parcel snap demo.
//!
//! Builds a small scene (one road, one zoning block, one placed parcel),
//! resolves a placement under each snap mode and logs where it lands, then
//! runs the same scene through the ECS plugin with a preview batch.
//!
//! Options:
//!   --settings <path>   load `SnapSettings` JSON for the ECS run
//!   --terrain <seed>    use generated terrain instead of flat ground

mod demo_scene;

use bevy::log::LogPlugin;
use bevy::prelude::*;

use parcel_snap::preview::{ParcelPreview, PreviewMember, SnapResult};
use parcel_snap::terrain::TerrainSurface;
use parcel_snap::{ParcelSnapPlugin, SnapModes, SnapSettings};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let settings_path = arg_value(&args, "--settings");
    let terrain_seed = arg_value(&args, "--terrain").and_then(|s| s.parse::<i32>().ok());

    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(LogPlugin::default());
    app.add_plugins(ParcelSnapPlugin);

    if let Some(seed) = terrain_seed {
        app.insert_resource(TerrainSurface::noise(seed));
    }
    if let Some(path) = settings_path {
        match load_settings(&path) {
            Ok(settings) => {
                app.insert_resource(settings);
            }
            Err(e) => {
                error!("Failed to load snap settings from {path}: {e}");
                std::process::exit(1);
            }
        }
    }

    // -- Headless scene, one run per mode ----------------------------------
    let scene = demo_scene::build_snapshot(terrain_seed);
    for (name, modes) in [
        ("zone side", SnapModes::ZONE_SIDE),
        ("road side", SnapModes::ROAD_SIDE),
        ("parcel edge", SnapModes::PARCEL_EDGE),
        ("front align", SnapModes::PARCEL_FRONT_ALIGN),
        ("all", SnapModes::ALL),
    ] {
        let settings = SnapSettings::with_modes(modes);
        for (label, request) in demo_scene::sample_requests() {
            match scene.resolve(&request, &settings) {
                Ok(Some(cp)) => info!(
                    "[{name}] {label}: {:?} -> {} facing {} ({:?}, level {})",
                    request.control_point.hit_position,
                    cp.position,
                    cp.direction,
                    cp.source,
                    cp.snap_priority.level
                ),
                Ok(None) => info!("[{name}] {label}: no snap"),
                Err(e) => warn!("[{name}] {label}: {e}"),
            }
        }
    }

    // -- Same scene through the ECS ------------------------------------------
    demo_scene::spawn_world(app.world_mut());
    let anchor = app
        .world_mut()
        .spawn(ParcelPreview::new(
            Vec3::new(3.0, 0.0, 10.0),
            Quat::IDENTITY,
            IVec2::new(2, 2),
        ))
        .id();
    app.world_mut().spawn(PreviewMember {
        anchor,
        local: Transform::from_xyz(16.0, 0.0, 0.0),
    });

    // First update syncs indexes and resolves; the second is a no-op frame.
    app.update();
    app.update();

    let world = app.world_mut();
    if let Some(result) = world.get::<SnapResult>(anchor) {
        match &result.snapped {
            Some(cp) => info!("preview anchor snapped to {} ({:?})", cp.position, cp.source),
            None => info!("preview anchor did not snap"),
        }
    }
    let mut members = world.query::<(&PreviewMember, &Transform)>();
    for (member, transform) in members.iter(world) {
        info!(
            "member of {} placed at {}",
            member.anchor, transform.translation
        );
    }
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn load_settings(path: &str) -> Result<SnapSettings, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    Ok(SnapSettings::from_json(&json)?)
}
