//! Snap configuration surface.
//!
//! A [`SnapModes`] bitmask enables each generator independently and a single
//! setback distance is shared by all of them. [`SnapSettings`] is a Bevy
//! resource so tools can flip modes at runtime; it round-trips through JSON
//! for settings files.

use std::ops::{BitOr, BitOrAssign};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::SnapError;

/// Bitmask of enabled snap generators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapModes(pub u8);

impl SnapModes {
    pub const NONE: Self = Self(0);
    pub const ZONE_SIDE: Self = Self(1 << 0);
    pub const ROAD_SIDE: Self = Self(1 << 1);
    pub const PARCEL_EDGE: Self = Self(1 << 2);
    pub const PARCEL_FRONT_ALIGN: Self = Self(1 << 3);
    pub const ALL: Self = Self(0b1111);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// True if either parcel mode is on; both share one generator.
    pub fn any_parcel(self) -> bool {
        self.intersects(Self::PARCEL_EDGE | Self::PARCEL_FRONT_ALIGN)
    }
}

impl BitOr for SnapModes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SnapModes {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Runtime snap configuration.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapSettings {
    pub modes: SnapModes,
    /// Distance kept between a parcel and whatever it aligns to.
    pub setback: f32,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            modes: SnapModes::ALL,
            setback: 0.0,
        }
    }
}

impl SnapSettings {
    pub fn with_modes(modes: SnapModes) -> Self {
        Self {
            modes,
            ..default()
        }
    }

    pub fn validate(&self) -> Result<(), SnapError> {
        if !self.setback.is_finite() || self.setback < 0.0 {
            return Err(SnapError::InvalidSetback(self.setback));
        }
        Ok(())
    }

    /// Parse and validate settings from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, SnapError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SnapError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
