//! Tracking and hit-test collaborator
//!
//! The engine never talks to a camera or a renderer directly. Hosts implement
//! [`TrackingProvider`] on top of their AR session and scene graph, and pass
//! it into every call that needs live geometric input.

use glam::{Mat4, Vec2};
use serde::{Deserialize, Serialize};

use crate::anchor::{AnchorId, AnchorKind};
use crate::node::NodeId;

/// Raycast result against detected surface geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceHit {
    /// World transform of the hit point on the surface
    pub transform: Mat4,
    pub anchor_id: Option<AnchorId>,
    pub anchor_kind: AnchorKind,
}

/// Renderer hit-test result against scene nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeHit {
    pub node_id: NodeId,
    pub node_name: String,
    /// World transform of the hit node
    pub node_transform: Mat4,
}

/// External tracking/rendering runtime
///
/// Implementations answer queries for the current frame only; results are
/// never cached by the engine.
///
/// # Example
///
/// ```ignore
/// struct ArHost { session: ArSession, view: SceneView }
///
/// impl TrackingProvider for ArHost {
///     fn current_camera_pose(&self) -> Option<Mat4> {
///         self.session.current_frame().map(|f| f.camera_transform())
///     }
///     // ...
/// }
/// ```
pub trait TrackingProvider {
    /// Camera pose of the latest frame, `None` while tracking is unavailable
    fn current_camera_pose(&self) -> Option<Mat4>;

    /// Raycast from a screen point against existing surface geometry
    ///
    /// Results are ordered nearest first.
    fn raycast_existing_surfaces(&self, point: Vec2) -> Vec<SurfaceHit>;

    /// Hit-test every node under a screen point, not just the front-most
    ///
    /// Results are ordered nearest first.
    fn hit_test_all_nodes(&self, point: Vec2) -> Vec<NodeHit>;

    /// Check whether a camera frame is available
    fn is_tracking(&self) -> bool {
        self.current_camera_pose().is_some()
    }
}

/// Tracking stub that answers every query with fixed results
///
/// Ignores the screen point. Used by headless hosts and tests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticTracking {
    #[serde(default)]
    pub camera_pose: Option<Mat4>,
    #[serde(default)]
    pub surface_hits: Vec<SurfaceHit>,
    #[serde(default)]
    pub node_hits: Vec<NodeHit>,
}

impl StaticTracking {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_camera(mut self, pose: Mat4) -> Self {
        self.camera_pose = Some(pose);
        self
    }

    pub fn with_surface_hit(mut self, hit: SurfaceHit) -> Self {
        self.surface_hits.push(hit);
        self
    }

    pub fn with_node_hit(mut self, hit: NodeHit) -> Self {
        self.node_hits.push(hit);
        self
    }
}

impl TrackingProvider for StaticTracking {
    fn current_camera_pose(&self) -> Option<Mat4> {
        self.camera_pose
    }

    fn raycast_existing_surfaces(&self, _point: Vec2) -> Vec<SurfaceHit> {
        self.surface_hits.clone()
    }

    fn hit_test_all_nodes(&self, _point: Vec2) -> Vec<NodeHit> {
        self.node_hits.clone()
    }
}
