//! Placement previews: the ghost parcels a placement tool moves around.
//!
//! A preview batch is one [`ParcelPreview`] anchor plus any number of
//! [`PreviewMember`]s laid out relative to it. Every frame the anchor is
//! resolved against the scene and the whole batch is moved rigidly onto the
//! result.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::components::NetLayers;
use crate::control_point::ControlPoint;
use crate::indexes::SnapIndexes;
use crate::lookup::EcsSnapGeometry;
use crate::resolver::{resolve_snap, PlacementRequest, TransformDelta};
use crate::settings::SnapSettings;
use crate::terrain::TerrainSurface;

/// Anchor of a preview batch. Holds the raw placement written by the tool;
/// the entity `Transform` holds the snapped result.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
#[require(Transform, SnapResult)]
pub struct ParcelPreview {
    pub hit_position: Vec3,
    pub rotation: Quat,
    pub elevation: f32,
    pub lot_size: IVec2,
    pub layers: NetLayers,
}

impl ParcelPreview {
    pub fn new(hit_position: Vec3, rotation: Quat, lot_size: IVec2) -> Self {
        Self {
            hit_position,
            rotation,
            elevation: 0.0,
            lot_size,
            layers: NetLayers::ROAD,
        }
    }

    pub fn with_elevation(mut self, elevation: f32) -> Self {
        self.elevation = elevation;
        self
    }

    pub fn with_layers(mut self, layers: NetLayers) -> Self {
        self.layers = layers;
        self
    }

    pub fn control_point(&self) -> ControlPoint {
        ControlPoint::raw(self.hit_position, self.rotation).with_elevation(self.elevation)
    }

    pub fn raw_transform(&self) -> Transform {
        Transform::from_translation(self.hit_position).with_rotation(self.rotation)
    }
}

/// Extra parcel placed together with an anchor, at `local` relative to the
/// anchor's raw placement.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
#[require(Transform)]
pub struct PreviewMember {
    pub anchor: Entity,
    pub local: Transform,
}

/// Outcome of the last resolution of an anchor.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct SnapResult {
    pub snapped: Option<ControlPoint>,
    /// Validation failure, kept so it is only logged once.
    pub rejected: Option<String>,
}

/// Resolve every anchor whose raw placement changed, or all anchors when
/// settings, indexes or terrain changed.
#[allow(clippy::too_many_arguments)]
pub fn resolve_parcel_previews(
    settings: Res<SnapSettings>,
    indexes: Res<SnapIndexes>,
    terrain: Res<TerrainSurface>,
    geometry: EcsSnapGeometry,
    members: Query<(Entity, &PreviewMember)>,
    mut previews: Query<(Entity, Ref<ParcelPreview>, &mut SnapResult)>,
) {
    #[cfg(feature = "trace")]
    let _span = info_span!("resolve_parcel_previews").entered();

    let scene_changed = settings.is_changed() || indexes.is_changed() || terrain.is_changed();

    let mut batches: HashMap<Entity, Vec<Entity>> = HashMap::new();
    for (entity, member) in &members {
        batches.entry(member.anchor).or_default().push(entity);
    }

    previews
        .par_iter_mut()
        .for_each(|(entity, preview, mut result)| {
            if !scene_changed && !preview.is_changed() {
                return;
            }
            let mut exclude = vec![entity];
            if let Some(batch) = batches.get(&entity) {
                exclude.extend_from_slice(batch);
            }
            let request = PlacementRequest::new(preview.control_point(), preview.lot_size)
                .with_layers(preview.layers)
                .excluding(&exclude);

            match resolve_snap(&request, &settings, &indexes, &geometry, &*terrain) {
                Ok(snapped) => {
                    result.snapped = snapped;
                    result.rejected = None;
                }
                Err(err) => {
                    let message = err.to_string();
                    if result.rejected.as_deref() != Some(message.as_str()) {
                        warn!("Skipping parcel preview {entity}: {message}");
                    }
                    result.snapped = None;
                    result.rejected = Some(message);
                }
            }
        });
}

/// Move each batch onto its anchor's result. Batches that did not snap go
/// back to their raw placement.
pub fn apply_snap_results(
    mut anchors: Query<(Entity, &ParcelPreview, &SnapResult, &mut Transform)>,
    mut members: Query<(&PreviewMember, &mut Transform), Without<ParcelPreview>>,
) {
    let mut deltas: HashMap<Entity, (Transform, TransformDelta)> = HashMap::new();
    for (entity, preview, result, mut transform) in &mut anchors {
        let raw = preview.control_point();
        let delta = match &result.snapped {
            Some(snapped) => TransformDelta::between(&raw, snapped),
            None => TransformDelta::identity(raw.position),
        };
        let raw_transform = preview.raw_transform();
        transform.set_if_neq(delta.apply(&raw_transform));
        deltas.insert(entity, (raw_transform, delta));
    }

    for (member, mut transform) in &mut members {
        let Some((anchor_raw, delta)) = deltas.get(&member.anchor) else {
            continue;
        };
        let raw_member = anchor_raw.mul_transform(member.local);
        transform.set_if_neq(delta.apply(&raw_member));
    }
}
