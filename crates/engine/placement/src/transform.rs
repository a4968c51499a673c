//! Pose composition helpers
//!
//! Poses are column-major [`Mat4`] values in world space. Composition follows
//! the scene-graph convention: a transform applied *later* in the object's
//! local frame is right-multiplied onto the current pose, so
//! `compose(pose, step)` moves the object along its own axes.
//!
//! Raw touch input arrives in screen pixels. [`Damping`] converts pixel deltas
//! into angles, distances, and scale increments.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

use crate::error::{PlacementError, Result};

/// Principal axis of an object's local frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Unit vector for this axis
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }
}

/// Divisor turning a raw pixel delta into a bounded increment
///
/// Always finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Damping(f32);

impl Damping {
    /// Validate a damping constant
    ///
    /// `name` identifies the constant in the returned error.
    pub fn new(name: &'static str, value: f32) -> Result<Self> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(PlacementError::InvalidDamping { name, value })
        }
    }

    /// The raw divisor
    pub fn value(self) -> f32 {
        self.0
    }

    /// Scale a pixel delta down by this constant
    pub fn apply(self, pixels: f32) -> f32 {
        pixels / self.0
    }
}

/// Matrix product `parent * child`
///
/// Not commutative: `child` is expressed in the frame of `parent`.
pub fn compose(parent: Mat4, child: Mat4) -> Mat4 {
    parent * child
}

/// Pure translation
pub fn translation_of(dx: f32, dy: f32, dz: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(dx, dy, dz))
}

/// Pure rotation of `angle` radians about a local axis
pub fn rotation_about_axis(axis: Axis, angle: f32) -> Mat4 {
    match axis {
        Axis::X => Mat4::from_rotation_x(angle),
        Axis::Y => Mat4::from_rotation_y(angle),
        Axis::Z => Mat4::from_rotation_z(angle),
    }
}

/// Uniform scale
pub fn scale_uniform(factor: f32) -> Mat4 {
    Mat4::from_scale(Vec3::splat(factor))
}

/// Local offset used for placing an object in front of the camera
///
/// The tracking camera frame is landscape-native, so its +X points along the
/// device's portrait "up". A quarter turn about Z re-aligns the object's +Y
/// with that direction before pushing it `forward` metres along -Z.
pub fn camera_local_offset(forward: f32) -> Mat4 {
    Mat4::from_rotation_translation(
        Quat::from_rotation_z(FRAC_PI_2),
        Vec3::new(0.0, 0.0, -forward),
    )
}

/// World pose `forward` metres in front of the camera with corrected up axis
pub fn camera_relative_offset(camera_pose: Mat4, forward: f32) -> Mat4 {
    compose(camera_pose, camera_local_offset(forward))
}

/// True if every matrix element is finite
pub fn is_finite_pose(pose: &Mat4) -> bool {
    pose.is_finite()
}

/// World-space position encoded in a pose
pub fn position_of(pose: &Mat4) -> Vec3 {
    pose.w_axis.truncate()
}
