// ---------------------------------------------------------------------------
// SnapError: precondition failures at the resolver boundary
// ---------------------------------------------------------------------------

use std::fmt;

use bevy::math::IVec2;

/// Errors raised before any generator runs.
///
/// Candidate rejections (stale entities, incompatible layers, ambiguous
/// facing) are never errors; they simply do not win.
#[derive(Debug)]
pub enum SnapError {
    /// Lot size must be positive along both axes.
    InvalidLotSize(IVec2),
    /// Setback must be finite and non-negative.
    InvalidSetback(f32),
    /// The raw hit position contains NaN or infinite components.
    NonFiniteHit,
    /// Snap settings could not be parsed or serialized.
    Settings(String),
}

impl fmt::Display for SnapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapError::InvalidLotSize(size) => {
                write!(f, "Invalid lot size {}x{}: both axes must be positive", size.x, size.y)
            }
            SnapError::InvalidSetback(setback) => {
                write!(f, "Invalid setback {setback}: must be finite and non-negative")
            }
            SnapError::NonFiniteHit => write!(f, "Hit position is not finite"),
            SnapError::Settings(msg) => write!(f, "Snap settings error: {msg}"),
        }
    }
}

impl std::error::Error for SnapError {}

impl From<serde_json::Error> for SnapError {
    fn from(e: serde_json::Error) -> Self {
        SnapError::Settings(e.to_string())
    }
}
