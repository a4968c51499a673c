//! Script player
//!
//! Stands in for the AR host: owns the session, the touch tracker and the
//! stub tracking provider, and feeds script steps through them in order.

use glam::{Mat4, Vec2, Vec3};
use placement::{
    AnchorEvent, AnchorId, GestureOutcome, ImageAnchorVisual, ManipulationMode, NodeHit, NodeId,
    PlacedObject, PlacementMode, SceneEvent, Session, StaticTracking, SurfaceAnchorVisual,
    SurfaceHit, TouchPhase, TouchPoint, TouchTracker,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::script::{Script, ScriptNodeHit, Step, TrackingStep};

/// Node id base for scripted hits that reference no placed object
///
/// Keeps scenery ids clear of the ids the engine allocates.
const SCENERY_NODE_BASE: u64 = 1 << 32;

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub action: &'static str,
    pub ok: bool,
    pub detail: String,
}

/// Final scene state
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub placement_mode: PlacementMode,
    pub manipulation_mode: ManipulationMode,
    pub planes_hidden: bool,
    pub objects: Vec<PlacedObject>,
    pub surfaces: Vec<SurfaceAnchorVisual>,
    pub images: Vec<ImageAnchorVisual>,
    pub events: usize,
    pub steps: Vec<StepReport>,
}

pub struct Player {
    session: Session,
    touches: TouchTracker,
    tracking: StaticTracking,
    next_touch: u64,
    events: Vec<SceneEvent>,
}

impl Player {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            touches: TouchTracker::new(),
            tracking: StaticTracking::new(),
            next_touch: 0,
            events: Vec::new(),
        }
    }

    /// Register templates and run every step
    ///
    /// Failed steps are logged and skipped; the rest of the script still runs.
    pub fn run(&mut self, script: &Script) -> Vec<StepReport> {
        for template in &script.templates {
            self.session.register_template(template.clone());
        }
        self.session.start();

        let mut reports = Vec::with_capacity(script.steps.len());
        for (index, step) in script.steps.iter().enumerate() {
            let report = match self.step(step) {
                Ok(detail) => {
                    debug!("step {} {}: {}", index, step.action(), detail);
                    StepReport {
                        index,
                        action: step.action(),
                        ok: true,
                        detail,
                    }
                }
                Err(e) => {
                    if e.is_interaction_miss() {
                        info!("step {} {} ignored: {}", index, step.action(), e);
                    } else {
                        warn!("step {} {} failed: {}", index, step.action(), e);
                    }
                    StepReport {
                        index,
                        action: step.action(),
                        ok: false,
                        detail: e.to_string(),
                    }
                }
            };
            self.events.extend(self.session.drain_events());
            reports.push(report);
        }
        reports
    }

    /// Execute one step
    pub fn step(&mut self, step: &Step) -> placement::Result<String> {
        match step {
            Step::SetPlacementMode { mode } => {
                self.session.set_placement_mode(*mode);
                Ok(format!("{mode:?}"))
            }
            Step::SetManipulationMode { mode } => {
                self.session.set_manipulation_mode(*mode);
                Ok(format!("{mode:?}"))
            }
            Step::SelectTemplate { template } => {
                self.session.select_template(template.as_str().into())?;
                Ok(template.clone())
            }
            Step::Tracking(tracking) => {
                self.tracking = self.build_tracking(tracking);
                Ok(format!(
                    "camera={} surfaces={} nodes={}",
                    self.tracking.camera_pose.is_some(),
                    self.tracking.surface_hits.len(),
                    self.tracking.node_hits.len()
                ))
            }
            Step::TouchBegan { x, y } => {
                if let Some(primary) = self.touches.primary().copied() {
                    self.touch(TouchPoint::new(primary.id, primary.position, TouchPhase::Ended))?;
                }
                self.next_touch += 1;
                let touch = TouchPoint::new(self.next_touch, Vec2::new(*x, *y), TouchPhase::Started);
                self.touch(touch)
            }
            Step::TouchMoved { x, y } => {
                let touch = TouchPoint::new(self.next_touch, Vec2::new(*x, *y), TouchPhase::Moved);
                self.touch(touch)
            }
            Step::TouchEnded => {
                let position = self.touches.primary().map_or(Vec2::ZERO, |p| p.position);
                self.touch(TouchPoint::new(self.next_touch, position, TouchPhase::Ended))
            }
            Step::Anchor(anchor) => {
                let event = AnchorEvent::from(anchor);
                self.session.apply_anchor_event(event)?;
                Ok(format!("{:?} {}", anchor.event, AnchorId(anchor.anchor)))
            }
            Step::Undo => Ok(match self.session.undo() {
                Some(object) => format!("removed {}", object.id),
                None => "nothing to undo".to_string(),
            }),
            Step::Start => {
                self.session.start();
                Ok("started".to_string())
            }
            Step::Reset => {
                self.touches.clear();
                self.session.reset();
                Ok("reset".to_string())
            }
            Step::ToggleSurfaces => {
                let hidden = self.session.toggle_surface_visibility();
                Ok(format!("hidden={hidden}"))
            }
        }
    }

    fn touch(&mut self, touch: TouchPoint) -> placement::Result<String> {
        let outcome = self
            .touches
            .handle(&mut self.session, touch, &self.tracking)?;
        Ok(match outcome {
            GestureOutcome::Began(outcome) => format!("{outcome:?}"),
            GestureOutcome::Moved(id) => format!("moved {id}"),
            GestureOutcome::Ended => "ended".to_string(),
            GestureOutcome::Ignored => "ignored".to_string(),
        })
    }

    fn build_tracking(&self, step: &TrackingStep) -> StaticTracking {
        let mut tracking = StaticTracking {
            camera_pose: step.camera_pose(),
            ..StaticTracking::default()
        };

        for hit in &step.surfaces {
            tracking = tracking.with_surface_hit(SurfaceHit {
                transform: Mat4::from_translation(Vec3::from(hit.position)),
                anchor_id: hit.anchor.map(AnchorId),
                anchor_kind: hit.kind,
            });
        }

        for (index, hit) in step.nodes.iter().enumerate() {
            match self.resolve_node_hit(index, hit) {
                Some(node_hit) => tracking = tracking.with_node_hit(node_hit),
                None => warn!("Dropping node hit {}: no placed object {:?}", index, hit.object),
            }
        }
        tracking
    }

    fn resolve_node_hit(&self, index: usize, hit: &ScriptNodeHit) -> Option<NodeHit> {
        let node_transform = Mat4::from_translation(Vec3::from(hit.position));

        let (node_id, default_name) = match hit.object {
            Some(object) => {
                let object = self.session.placed_objects().get(object)?;
                match hit.part {
                    Some(part) => {
                        let template = self.session.templates().get(&object.template);
                        let name = template
                            .and_then(|t| t.parts.get(part))
                            .cloned()
                            .unwrap_or_default();
                        (*object.parts.get(part)?, name)
                    }
                    None => (object.root_node, object.template.to_string()),
                }
            }
            None => (
                NodeId(hit.node.unwrap_or(SCENERY_NODE_BASE + index as u64)),
                String::new(),
            ),
        };

        Some(NodeHit {
            node_id,
            node_name: hit.name.clone().unwrap_or(default_name),
            node_transform,
        })
    }

    pub fn report(&self, steps: Vec<StepReport>) -> Report {
        Report {
            placement_mode: self.session.placement_mode(),
            manipulation_mode: self.session.manipulation_mode(),
            planes_hidden: self.session.planes_hidden(),
            objects: self.session.placed_objects().to_vec(),
            surfaces: self.session.surface_visuals().to_vec(),
            images: self.session.image_visuals().to_vec(),
            events: self.events().len(),
            steps,
        }
    }

    /// Every scene event emitted so far, oldest first
    pub fn events(&self) -> &[SceneEvent] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placement::{PlacementError, SelectionChange, TouchOutcome};

    fn run(source: &str) -> (Player, Vec<StepReport>) {
        let script = Script::from_toml_str(source).unwrap();
        let mut player = Player::new(Session::default());
        let reports = player.run(&script);
        (player, reports)
    }

    const PLANE_SCRIPT: &str = r#"
        [[templates]]
        id = "chair"
        parts = ["seat", "back"]

        [[steps]]
        action = "select_template"
        template = "chair"

        [[steps]]
        action = "set_placement_mode"
        mode = "plane"

        [[steps]]
        action = "tracking"
        camera = [0.0, 1.5, 0.0]
        surfaces = [{ position = [0.0, 0.0, -1.0] }]

        [[steps]]
        action = "touch_began"
        x = 100.0
        y = 100.0

        [[steps]]
        action = "touch_moved"
        x = 300.0
        y = 100.0
    "#;

    #[test]
    fn test_plane_placement_and_drag() {
        let (player, reports) = run(PLANE_SCRIPT);
        assert!(reports.iter().all(|r| r.ok), "{reports:?}");

        let objects = player.session.placed_objects();
        assert_eq!(objects.len(), 1);
        let position = objects[0].pose.w_axis.truncate();
        assert!(position.abs_diff_eq(Vec3::new(1.0, 0.0, -1.0), 1e-5));
        assert!(matches!(player.events()[0], SceneEvent::SessionReloaded { .. }));
    }

    #[test]
    fn test_object_index_selects() {
        let source = format!(
            "{PLANE_SCRIPT}{}",
            r#"
            [[steps]]
            action = "set_placement_mode"
            mode = "transform"

            [[steps]]
            action = "tracking"
            camera = [0.0, 1.5, 0.0]
            nodes = [{ name = "floor" }, { object = 0, part = 1 }]

            [[steps]]
            action = "touch_began"
            x = 100.0
            y = 100.0
            "#
        );
        let (player, reports) = run(&source);

        let object = &player.session.placed_objects()[0];
        assert!(object.highlighted);
        let expected = TouchOutcome::Selection(SelectionChange::Highlighted {
            current: object.id,
            previous: None,
        });
        assert_eq!(reports.last().unwrap().detail, format!("{expected:?}"));
    }

    #[test]
    fn test_failures_are_skipped() {
        let (player, reports) = run(
            r#"
            [[steps]]
            action = "touch_began"
            x = 0.0
            y = 0.0

            [[steps]]
            action = "select_template"
            template = "missing"

            [[steps]]
            action = "anchor"
            event = "surface_updated"
            anchor = 5
            width = 1.0
            depth = 1.0

            [[steps]]
            action = "anchor"
            event = "surface_added"
            anchor = 6
            width = 1.0
            depth = 1.0
            "#,
        );

        assert_eq!(
            reports.iter().map(|r| r.ok).collect::<Vec<_>>(),
            vec![false, false, false, true]
        );
        assert_eq!(reports[0].detail, PlacementError::NoTemplateSelected.to_string());
        assert_eq!(player.session.surface_visuals().len(), 1);
    }

    #[test]
    fn test_unknown_object_index_dropped() {
        let (player, _) = run(
            r#"
            [[steps]]
            action = "tracking"
            nodes = [{ object = 3 }, { node = 42, name = "table" }]
            "#,
        );
        assert_eq!(player.tracking.node_hits.len(), 1);
        assert_eq!(player.tracking.node_hits[0].node_id, NodeId(42));
    }

    #[test]
    fn test_reset_report() {
        let source = format!(
            "{PLANE_SCRIPT}{}",
            r#"
            [[steps]]
            action = "anchor"
            event = "surface_added"
            anchor = 1
            width = 1.0
            depth = 1.0

            [[steps]]
            action = "reset"
            "#
        );
        let (player, steps) = run(&source);
        let report = player.report(steps);

        assert!(report.objects.is_empty());
        assert!(report.surfaces.is_empty());
        assert!(report.planes_hidden);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["placement_mode"], "plane");
        assert_eq!(json["steps"].as_array().unwrap().len(), 7);
    }
}
