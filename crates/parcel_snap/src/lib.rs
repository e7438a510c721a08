//! Snap resolution for parcel placement.
//!
//! While a parcel is being placed, its raw cursor position and facing are
//! adjusted so the lot lines up with nearby zoning blocks, road sides and
//! already-placed parcels. Independent generators each propose at most one
//! candidate, a priority arbiter picks the winner, and the winner's height
//! is resolved against the terrain.

use bevy::prelude::*;

pub mod arbiter;
pub mod components;
pub mod config;
pub mod control_point;
pub mod error;
pub mod footprint;
pub mod generators;
pub mod geometry;
pub mod height;
pub mod indexes;
pub mod lookup;
pub mod preview;
pub mod resolver;
pub mod scene;
pub mod settings;
pub mod spatial_index;
pub mod terrain;

pub use control_point::{ControlPoint, SnapPriority, SnapSource};
pub use error::SnapError;
pub use resolver::{resolve_snap, PlacementRequest, TransformDelta};
pub use settings::{SnapModes, SnapSettings};

/// Per-frame ordering of the snap systems in `Update`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SnapSet {
    /// Bring the spatial indexes up to date with scene components.
    SyncIndexes,
    /// Resolve every preview anchor.
    Resolve,
    /// Write results into preview transforms.
    Apply,
}

pub struct ParcelSnapPlugin;

impl Plugin for ParcelSnapPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SnapSettings>()
            .init_resource::<indexes::SnapIndexes>()
            .init_resource::<terrain::TerrainSurface>()
            .configure_sets(
                Update,
                (SnapSet::SyncIndexes, SnapSet::Resolve, SnapSet::Apply).chain(),
            )
            .add_systems(
                Update,
                (
                    indexes::sync_block_index,
                    indexes::sync_net_index,
                    indexes::sync_parcel_index,
                )
                    .in_set(SnapSet::SyncIndexes),
            )
            .add_systems(
                Update,
                preview::resolve_parcel_previews.in_set(SnapSet::Resolve),
            )
            .add_systems(Update, preview::apply_snap_results.in_set(SnapSet::Apply));
    }
}
