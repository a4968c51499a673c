//! Error types for the placement engine

use crate::anchor::AnchorId;
use crate::placement::PlacementMode;
use crate::template::TemplateId;

/// Errors that can occur during placement, manipulation, or anchor bookkeeping
///
/// None of these are fatal. Interaction misses are expected during normal use
/// and callers are free to ignore them.
#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    /// A creation touch arrived before any template was selected
    #[error("No template selected")]
    NoTemplateSelected,

    /// The requested template is not registered in the library
    #[error("Unknown template: {0}")]
    UnknownTemplate(TemplateId),

    /// The tracking system has no camera frame right now
    #[error("Tracking unavailable")]
    TrackingUnavailable,

    /// Raycast produced no hit on a horizontal surface anchor
    #[error("No horizontal surface under the touch point")]
    NoSurfaceHit,

    /// Hit-test produced no hit on an image cover
    #[error("No detected image under the touch point")]
    NoImageHit,

    /// Anchor update referenced an anchor that is not registered
    #[error("Unknown anchor id: {0}")]
    UnknownAnchorId(AnchorId),

    /// Non-finite or negative extent, center, or pose
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Damping constants must be finite and strictly positive
    #[error("Invalid damping constant {name}: {value}")]
    InvalidDamping { name: &'static str, value: f32 },

    /// Placement was requested in a mode that never creates objects
    #[error("Placement mode {0:?} does not create objects")]
    NotACreationMode(PlacementMode),

    /// Drag arrived with nothing to manipulate
    #[error("No manipulation target")]
    NoTarget,

    /// Manipulation is disabled in the current placement mode
    #[error("Manipulation disabled in {0:?} mode")]
    ManipulationDisabled(PlacementMode),

    /// Scale update would collapse or mirror the object
    #[error("Scale factor {0} rejected, must be > 0")]
    ScaleRejected(f32),

    /// Config file could not be parsed
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// Config file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for placement operations
pub type Result<T> = std::result::Result<T, PlacementError>;

impl PlacementError {
    /// Returns true for "tap into nothing" outcomes that the UI drops silently
    pub fn is_interaction_miss(&self) -> bool {
        matches!(
            self,
            PlacementError::NoTemplateSelected
                | PlacementError::TrackingUnavailable
                | PlacementError::NoSurfaceHit
                | PlacementError::NoImageHit
                | PlacementError::NoTarget
                | PlacementError::ManipulationDisabled(_)
                | PlacementError::ScaleRejected(_)
        )
    }
}
