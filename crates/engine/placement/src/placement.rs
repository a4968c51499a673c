//! Placement resolver
//!
//! Turns a touch point plus the tracker's answers into the world pose of a new
//! object. Which answer counts depends on the [`PlacementMode`]:
//!
//! | Mode        | Input                        | Pose                                   |
//! |-------------|------------------------------|----------------------------------------|
//! | `Freeform`  | camera pose                  | fixed distance in front of the camera  |
//! | `Plane`     | raycast vs. surfaces         | hit transform as-is                    |
//! | `Image`     | node hit-test                | image cover transform, stood upright   |
//! | `Transform` | n/a                          | never creates                          |

use glam::{Mat4, Vec2};
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;
use tracing::debug;

use crate::anchor::AnchorKind;
use crate::error::{PlacementError, Result};
use crate::node::IMAGE_NODE_NAME;
use crate::tracking::TrackingProvider;
use crate::transform::{camera_relative_offset, compose, is_finite_pose, rotation_about_axis, Axis};

/// What a touch-began does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementMode {
    /// Drop the object in mid-air in front of the camera
    #[default]
    Freeform,
    /// Drop the object onto a detected horizontal surface
    Plane,
    /// Stand the object on a recognised image
    Image,
    /// Select placed objects for manipulation
    Transform,
}

impl PlacementMode {
    /// True for modes in which a touch creates an object
    pub fn creates_objects(self) -> bool {
        !matches!(self, PlacementMode::Transform)
    }

    /// True if surface visuals should be shown while this mode is active
    pub fn shows_surfaces(self) -> bool {
        matches!(self, PlacementMode::Plane)
    }
}

/// Pose for an object created in front of the camera
pub fn resolve_freeform(tracking: &dyn TrackingProvider, forward_offset: f32) -> Result<Mat4> {
    let camera = tracking
        .current_camera_pose()
        .ok_or(PlacementError::TrackingUnavailable)?;
    Ok(camera_relative_offset(camera, forward_offset))
}

/// Pose for an object created on the first horizontal surface under `point`
pub fn resolve_plane(tracking: &dyn TrackingProvider, point: Vec2) -> Result<Mat4> {
    tracking
        .raycast_existing_surfaces(point)
        .into_iter()
        .find(|hit| hit.anchor_kind == AnchorKind::HorizontalSurface)
        .map(|hit| hit.transform)
        .ok_or(PlacementError::NoSurfaceHit)
}

/// Pose for an object created on the first image cover under `point`
///
/// The cover lies flat in the image plane; a quarter turn about its local X
/// stands the object up off the marker.
pub fn resolve_image(tracking: &dyn TrackingProvider, point: Vec2) -> Result<Mat4> {
    tracking
        .hit_test_all_nodes(point)
        .into_iter()
        .find(|hit| hit.node_name == IMAGE_NODE_NAME)
        .map(|hit| compose(hit.node_transform, rotation_about_axis(Axis::X, FRAC_PI_2)))
        .ok_or(PlacementError::NoImageHit)
}

/// Resolve the creation pose for `mode`
pub fn resolve_pose(
    mode: PlacementMode,
    point: Vec2,
    tracking: &dyn TrackingProvider,
    forward_offset: f32,
) -> Result<Mat4> {
    let pose = match mode {
        PlacementMode::Freeform => resolve_freeform(tracking, forward_offset)?,
        PlacementMode::Plane => resolve_plane(tracking, point)?,
        PlacementMode::Image => resolve_image(tracking, point)?,
        PlacementMode::Transform => return Err(PlacementError::NotACreationMode(mode)),
    };

    if !is_finite_pose(&pose) {
        return Err(PlacementError::InvalidGeometry(format!(
            "non-finite {mode:?} placement pose"
        )));
    }
    debug!("Resolved {:?} placement at {}", mode, pose.w_axis.truncate());
    Ok(pose)
}
