//! Manipulation engine
//!
//! Applies one touch-move sample (a screen-space delta in pixels) to a pose.
//! Every step is composed in the object's local frame, so dragging "right"
//! moves along the object's own X axis regardless of where the camera is.

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::DampingConfig;
use crate::error::{PlacementError, Result};
use crate::placement::PlacementMode;
use crate::transform::{
    compose, is_finite_pose, rotation_about_axis, scale_uniform, translation_of, Axis, Damping,
};

/// What a drag does to the highlighted object in transform mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManipulationMode {
    #[default]
    Move,
    Rotate,
    Scale,
}

/// Which object a drag applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    /// The most recently placed object (drag right after creation)
    LastPlaced,
    /// The object selected in transform mode
    Highlighted,
}

/// Gesture context, selects between the two move damping constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragContext {
    Creation,
    Transform,
}

/// Resolved meaning of a drag in the current modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragPlan {
    pub target: DragTarget,
    pub operation: ManipulationMode,
    pub context: DragContext,
}

impl DragPlan {
    /// Decide what a drag does
    ///
    /// Right after creation a freeform object is turned and a plane object is
    /// slid along its surface. Image-anchored objects stay put. In transform
    /// mode the manipulation mode picks the operation.
    pub fn for_modes(placement: PlacementMode, manipulation: ManipulationMode) -> Result<Self> {
        match placement {
            PlacementMode::Freeform => Ok(Self {
                target: DragTarget::LastPlaced,
                operation: ManipulationMode::Rotate,
                context: DragContext::Creation,
            }),
            PlacementMode::Plane => Ok(Self {
                target: DragTarget::LastPlaced,
                operation: ManipulationMode::Move,
                context: DragContext::Creation,
            }),
            PlacementMode::Image => Err(PlacementError::ManipulationDisabled(placement)),
            PlacementMode::Transform => Ok(Self {
                target: DragTarget::Highlighted,
                operation: manipulation,
                context: DragContext::Transform,
            }),
        }
    }

    /// Damping constant for this plan
    pub fn damping(&self, config: &DampingConfig) -> Result<Damping> {
        match (self.operation, self.context) {
            (ManipulationMode::Move, DragContext::Creation) => config.move_creation(),
            (ManipulationMode::Move, DragContext::Transform) => config.move_transform(),
            (ManipulationMode::Rotate, _) => config.rotate(),
            (ManipulationMode::Scale, _) => config.scale(),
        }
    }

    /// Move and scale need a live camera frame; rotation does not
    pub fn requires_tracking(&self) -> bool {
        !matches!(self.operation, ManipulationMode::Rotate)
    }
}

/// Slide along the local X/Z plane
///
/// Screen X maps to local X and screen Y to local Z; height is untouched.
pub fn move_pose(pose: Mat4, delta: Vec2, damping: Damping) -> Mat4 {
    compose(
        pose,
        translation_of(damping.apply(delta.x), 0.0, damping.apply(delta.y)),
    )
}

/// Euler rotation steps in application order
///
/// Order is fixed at X, then Y, then Z.
pub fn rotation_steps(angles: Vec3) -> [Mat4; 3] {
    [
        rotation_about_axis(Axis::X, angles.x),
        rotation_about_axis(Axis::Y, angles.y),
        rotation_about_axis(Axis::Z, angles.z),
    ]
}

/// Turn about the local axes
///
/// Screen X drives the X axis and screen Y the Z axis.
pub fn rotate_pose(pose: Mat4, delta: Vec2, damping: Damping) -> Mat4 {
    let angles = Vec3::new(damping.apply(delta.x), 0.0, damping.apply(delta.y));
    rotation_steps(angles).into_iter().fold(pose, compose)
}

/// Grow or shrink uniformly by `1 + dy / k`
///
/// Rejects factors that would collapse or mirror the object.
pub fn scale_pose(pose: Mat4, delta: Vec2, damping: Damping) -> Result<Mat4> {
    let factor = 1.0 + damping.apply(delta.y);
    if !factor.is_finite() || factor <= 0.0 {
        return Err(PlacementError::ScaleRejected(factor));
    }
    Ok(compose(pose, scale_uniform(factor)))
}

/// Apply one drag sample
pub fn apply(
    operation: ManipulationMode,
    pose: Mat4,
    delta: Vec2,
    damping: Damping,
) -> Result<Mat4> {
    if !delta.is_finite() {
        return Err(PlacementError::InvalidGeometry(format!("drag delta {delta}")));
    }

    let next = match operation {
        ManipulationMode::Move => move_pose(pose, delta, damping),
        ManipulationMode::Rotate => rotate_pose(pose, delta, damping),
        ManipulationMode::Scale => scale_pose(pose, delta, damping)?,
    };

    if !is_finite_pose(&next) {
        return Err(PlacementError::InvalidGeometry(
            "manipulation produced a non-finite pose".into(),
        ));
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::position_of;

    const EPS: f32 = 1e-5;

    fn k(value: f32) -> Damping {
        Damping::new("test", value).unwrap()
    }

    #[test]
    fn test_move_is_local() {
        let pose = move_pose(Mat4::IDENTITY, Vec2::new(200.0, -400.0), k(200.0));
        assert!(position_of(&pose).abs_diff_eq(Vec3::new(1.0, 0.0, -2.0), EPS));

        // Turned object moves along its own X
        let turned = Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let pose = move_pose(turned, Vec2::new(200.0, 0.0), k(200.0));
        assert!(position_of(&pose).abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), EPS));
    }

    #[test]
    fn test_rotate_order_x_then_y_then_z() {
        let delta = Vec2::new(30.0, -20.0);
        let pose = rotate_pose(Mat4::IDENTITY, delta, k(50.0));
        let expected = Mat4::from_rotation_x(30.0 / 50.0) * Mat4::from_rotation_z(-20.0 / 50.0);
        assert!(pose.abs_diff_eq(expected, EPS));
    }

    #[test]
    fn test_rotation_is_not_commutative() {
        // X-then-Y differs from Y-then-X for any nonzero pair of angles
        for a in [-1.3_f32, -0.4, 0.2, 0.9, 2.5] {
            for b in [-2.0_f32, -0.7, 0.1, 0.6, 1.8] {
                let xy = rotation_about_axis(Axis::X, a) * rotation_about_axis(Axis::Y, b);
                let yx = rotation_about_axis(Axis::Y, b) * rotation_about_axis(Axis::X, a);
                assert!(!xy.abs_diff_eq(yx, 1e-4), "a={a} b={b}");
            }
        }
    }

    #[test]
    fn test_rotation_steps_not_commutative_through_pose() {
        for dx in [-80.0_f32, -15.0, 10.0, 45.0] {
            for dy in [-60.0_f32, -5.0, 25.0, 70.0] {
                let ordered = rotate_pose(Mat4::IDENTITY, Vec2::new(dx, dy), k(50.0));
                let reversed = Mat4::from_rotation_z(dy / 50.0) * Mat4::from_rotation_x(dx / 50.0);
                assert!(!ordered.abs_diff_eq(reversed, 1e-4), "dx={dx} dy={dy}");
            }
        }
    }

    #[test]
    fn test_scale_grows_and_shrinks() {
        let grown = scale_pose(Mat4::IDENTITY, Vec2::new(0.0, 25.0), k(50.0)).unwrap();
        assert!(grown.abs_diff_eq(Mat4::from_scale(Vec3::splat(1.5)), EPS));

        let shrunk = scale_pose(Mat4::IDENTITY, Vec2::new(999.0, -25.0), k(50.0)).unwrap();
        assert!(shrunk.abs_diff_eq(Mat4::from_scale(Vec3::splat(0.5)), EPS));
    }

    #[test]
    fn test_scale_rejects_non_positive_factor() {
        for dy in [-50.0_f32, -51.0, -500.0] {
            let result = scale_pose(Mat4::IDENTITY, Vec2::new(0.0, dy), k(50.0));
            assert!(matches!(result, Err(PlacementError::ScaleRejected(f)) if f <= 0.0));
        }
    }

    #[test]
    fn test_apply_rejects_nan_delta() {
        let result = apply(
            ManipulationMode::Move,
            Mat4::IDENTITY,
            Vec2::new(f32::NAN, 0.0),
            k(200.0),
        );
        assert!(matches!(result, Err(PlacementError::InvalidGeometry(_))));
    }

    #[test]
    fn test_drag_plan() {
        let plan = DragPlan::for_modes(PlacementMode::Freeform, ManipulationMode::Scale).unwrap();
        assert_eq!(plan.target, DragTarget::LastPlaced);
        assert_eq!(plan.operation, ManipulationMode::Rotate);
        assert!(!plan.requires_tracking());

        let plan = DragPlan::for_modes(PlacementMode::Plane, ManipulationMode::Rotate).unwrap();
        assert_eq!(plan.operation, ManipulationMode::Move);
        assert_eq!(plan.context, DragContext::Creation);

        let plan = DragPlan::for_modes(PlacementMode::Transform, ManipulationMode::Scale).unwrap();
        assert_eq!(plan.target, DragTarget::Highlighted);
        assert_eq!(plan.operation, ManipulationMode::Scale);
        assert!(plan.requires_tracking());

        assert!(matches!(
            DragPlan::for_modes(PlacementMode::Image, ManipulationMode::Move),
            Err(PlacementError::ManipulationDisabled(PlacementMode::Image))
        ));
    }

    #[test]
    fn test_plan_damping_selection() {
        let config = DampingConfig {
            move_creation: 300.0,
            move_transform: 200.0,
            rotate: 30.0,
            scale: 10.0,
        };
        let creation = DragPlan::for_modes(PlacementMode::Plane, ManipulationMode::Move).unwrap();
        let transform =
            DragPlan::for_modes(PlacementMode::Transform, ManipulationMode::Move).unwrap();
        assert_eq!(creation.damping(&config).unwrap().value(), 300.0);
        assert_eq!(transform.damping(&config).unwrap().value(), 200.0);
    }
}
