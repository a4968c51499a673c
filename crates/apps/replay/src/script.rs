//! Replay script format
//!
//! A script is a TOML file with a template list and an ordered list of steps:
//!
//! ```toml
//! [[templates]]
//! id = "chair"
//! parts = ["seat", "back"]
//!
//! [[steps]]
//! action = "select_template"
//! template = "chair"
//!
//! [[steps]]
//! action = "tracking"
//! camera = [0.0, 1.5, 0.0]
//! surfaces = [{ position = [0.0, 0.0, -1.0] }]
//!
//! [[steps]]
//! action = "touch_began"
//! x = 180.0
//! y = 600.0
//! ```

use anyhow::{Context, Result};
use glam::{Mat4, Quat, Vec3};
use placement::{
    AnchorEvent, AnchorId, AnchorKind, ImageAnchorEvent, ManipulationMode, PhysicalSize,
    PlacementMode, SurfaceAnchorEvent, SurfaceExtent, Template,
};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub templates: Vec<Template>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing script {}", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    SetPlacementMode {
        mode: PlacementMode,
    },
    SetManipulationMode {
        mode: ManipulationMode,
    },
    SelectTemplate {
        template: String,
    },
    /// Replace what the stub tracker answers from now on
    Tracking(TrackingStep),
    TouchBegan {
        x: f32,
        y: f32,
    },
    TouchMoved {
        x: f32,
        y: f32,
    },
    TouchEnded,
    Anchor(AnchorStep),
    Undo,
    Start,
    Reset,
    ToggleSurfaces,
}

impl Step {
    pub fn action(&self) -> &'static str {
        match self {
            Step::SetPlacementMode { .. } => "set_placement_mode",
            Step::SetManipulationMode { .. } => "set_manipulation_mode",
            Step::SelectTemplate { .. } => "select_template",
            Step::Tracking(_) => "tracking",
            Step::TouchBegan { .. } => "touch_began",
            Step::TouchMoved { .. } => "touch_moved",
            Step::TouchEnded => "touch_ended",
            Step::Anchor(_) => "anchor",
            Step::Undo => "undo",
            Step::Start => "start",
            Step::Reset => "reset",
            Step::ToggleSurfaces => "toggle_surfaces",
        }
    }
}

/// Scripted tracker state
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackingStep {
    /// Camera position; omit to simulate lost tracking
    #[serde(default)]
    pub camera: Option<[f32; 3]>,
    /// Camera yaw about world +Y
    #[serde(default)]
    pub camera_yaw_degrees: f32,
    #[serde(default)]
    pub surfaces: Vec<ScriptSurfaceHit>,
    #[serde(default)]
    pub nodes: Vec<ScriptNodeHit>,
}

impl TrackingStep {
    pub fn camera_pose(&self) -> Option<Mat4> {
        self.camera.map(|position| {
            Mat4::from_rotation_translation(
                Quat::from_rotation_y(self.camera_yaw_degrees.to_radians()),
                Vec3::from(position),
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptSurfaceHit {
    pub position: [f32; 3],
    #[serde(default = "default_surface_kind")]
    pub kind: AnchorKind,
    #[serde(default)]
    pub anchor: Option<u64>,
}

fn default_surface_kind() -> AnchorKind {
    AnchorKind::HorizontalSurface
}

/// Node hit; `object` refers to a placed object by insertion index
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptNodeHit {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub node: Option<u64>,
    #[serde(default)]
    pub object: Option<usize>,
    /// Part index within `object`; the root node when omitted
    #[serde(default)]
    pub part: Option<usize>,
    #[serde(default)]
    pub position: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorChange {
    SurfaceAdded,
    SurfaceUpdated,
    SurfaceRemoved,
    ImageAdded,
    ImageUpdated,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnchorStep {
    pub event: AnchorChange,
    pub anchor: u64,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub depth: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub center: [f32; 3],
    /// Type name reported for unknown anchors
    #[serde(default)]
    pub kind: Option<String>,
}

impl From<&AnchorStep> for AnchorEvent {
    fn from(step: &AnchorStep) -> Self {
        let anchor_id = AnchorId(step.anchor);
        let extent = SurfaceExtent::new(step.width, step.depth);
        let center = Vec3::from(step.center);
        match step.event {
            AnchorChange::SurfaceAdded => AnchorEvent::Surface(SurfaceAnchorEvent::Added {
                anchor_id,
                extent,
                center,
            }),
            AnchorChange::SurfaceUpdated => AnchorEvent::Surface(SurfaceAnchorEvent::Updated {
                anchor_id,
                extent,
                center,
            }),
            AnchorChange::SurfaceRemoved => {
                AnchorEvent::Surface(SurfaceAnchorEvent::Removed { anchor_id })
            }
            AnchorChange::ImageAdded => AnchorEvent::Image(ImageAnchorEvent::Added {
                anchor_id,
                size: PhysicalSize::new(step.width, step.height),
            }),
            AnchorChange::ImageUpdated => AnchorEvent::Image(ImageAnchorEvent::Updated { anchor_id }),
            AnchorChange::Unknown => AnchorEvent::Unknown {
                anchor_id,
                kind: step.kind.clone().unwrap_or_else(|| "unknown".to_string()),
            },
        }
    }
}
