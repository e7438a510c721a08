use std::cmp::Ordering;

use bevy::prelude::*;

use crate::config::SNAP_LEVEL_NONE;
use crate::geometry::{direction_to_rotation, rotation_to_direction};

/// Two-part snap ranking: `level` is the snap category, `score` breaks ties
/// within a level (higher is better).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapPriority {
    pub level: f32,
    pub score: f32,
}

impl SnapPriority {
    pub const NONE: Self = Self {
        level: SNAP_LEVEL_NONE,
        score: 0.0,
    };

    pub fn new(level: f32, score: f32) -> Self {
        Self { level, score }
    }

    /// Priority whose score grows as `offset` (distance from the raw hit
    /// point) shrinks.
    pub fn from_offset(level: f32, offset: f32) -> Self {
        Self {
            level,
            score: 1.0 / (1.0 + offset.max(0.0)),
        }
    }

    /// Total order: level first, score only at equal level.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.level
            .total_cmp(&other.level)
            .then_with(|| self.score.total_cmp(&other.score))
    }

    pub fn is_higher_than(&self, other: &Self) -> bool {
        self.total_cmp(other) == Ordering::Greater
    }

    pub fn is_snapped(&self) -> bool {
        self.is_higher_than(&Self::NONE)
    }
}

/// Which generator produced a control point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SnapSource {
    #[default]
    None,
    ZoneSide,
    RoadSide,
    ParcelEdge,
    FrontAlign,
}

/// A proposed placement, threaded through every generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    /// Raw, unsnapped placement point.
    pub hit_position: Vec3,
    pub position: Vec3,
    pub rotation: Quat,
    /// Horizontal forward vector `(x, z)`.
    pub direction: Vec2,
    pub snap_priority: SnapPriority,
    /// Block, edge, node or parcel the snap aligned to.
    pub original_entity: Option<Entity>,
    pub source: SnapSource,
    /// Requested height above the sampled ground.
    pub elevation: f32,
    /// Parameter on the matched road curve.
    pub curve_position: f32,
}

impl ControlPoint {
    /// Unsnapped control point at `hit_position` facing `rotation`.
    pub fn raw(hit_position: Vec3, rotation: Quat) -> Self {
        Self {
            hit_position,
            position: hit_position,
            rotation,
            direction: rotation_to_direction(rotation),
            snap_priority: SnapPriority::NONE,
            original_entity: None,
            source: SnapSource::None,
            elevation: 0.0,
            curve_position: 0.0,
        }
    }

    pub fn with_elevation(mut self, elevation: f32) -> Self {
        self.elevation = elevation;
        self
    }

    /// Copy of `self` moved to a snapped horizontal placement. The vertical
    /// coordinate is left to the height resolver.
    pub(crate) fn snapped(
        &self,
        center: Vec2,
        direction: Vec2,
        priority: SnapPriority,
        source: SnapSource,
        entity: Entity,
    ) -> Self {
        Self {
            position: Vec3::new(center.x, self.position.y, center.y),
            rotation: direction_to_rotation(direction),
            direction,
            snap_priority: priority,
            original_entity: Some(entity),
            source,
            ..*self
        }
    }

    /// Horizontal distance between the proposed and raw positions.
    pub fn offset(&self) -> f32 {
        (self.position.xz() - self.hit_position.xz()).length()
    }
}
