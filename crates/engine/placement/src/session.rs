//! Placement session
//!
//! [`Session`] owns all mutable engine state: modes, the selected template,
//! placed objects, anchor visuals, and the queue of [`SceneEvent`]s the
//! renderer replays to mirror that state. Every mutation goes through a
//! setter that performs its side effects in the same call, so there is no
//! observer machinery to keep in sync.
//!
//! ## Event flow
//!
//! ```text
//! touch began ──> PlacementMode ──┬─> placement::resolve_pose ──> ObjectStore::append
//!                                 └─> selection::toggle_target (transform mode)
//! touch moved ──> DragPlan ──> manipulation::apply ──> PlacedObject::pose
//! anchor event ──> AnchorRegistry
//!                        │
//!                        └──> SceneEvent queue ──> drain_events() ──> renderer
//! ```

use glam::{Mat4, Vec2};
use tracing::{debug, info, warn};

use crate::anchor::{
    AnchorEvent, AnchorId, AnchorRegistry, ImageAnchorEvent, ImageAnchorVisual,
    SurfaceAnchorEvent, SurfaceAnchorVisual,
};
use crate::config::PlacementConfig;
use crate::error::{PlacementError, Result};
use crate::manipulation::{self, DragPlan, DragTarget, ManipulationMode};
use crate::node::{NodeId, NodeIdAllocator};
use crate::placement::{resolve_pose, PlacementMode};
use crate::selection::{toggle_target, SelectionChange};
use crate::store::{ObjectId, ObjectStore, PlacedObject};
use crate::template::{Template, TemplateId, TemplateLibrary};
use crate::tracking::TrackingProvider;

/// Change the renderer must mirror
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// Add a clone of `template` under the scene root
    ObjectAdded(PlacedObject),
    ObjectPoseChanged { id: ObjectId, pose: Mat4 },
    ObjectRemoved { id: ObjectId, root_node: NodeId },
    /// Highlight moved; render `current` at highlight opacity and `previous` opaque
    HighlightChanged {
        current: Option<ObjectId>,
        previous: Option<ObjectId>,
    },
    SurfaceVisualAdded(SurfaceAnchorVisual),
    SurfaceVisualUpdated(SurfaceAnchorVisual),
    SurfaceVisualRemoved { anchor_id: AnchorId, node_id: NodeId },
    SurfaceVisibilityChanged { hidden: bool },
    ImageVisualAdded(ImageAnchorVisual),
    /// Every mirrored node is gone; the host should re-run tracking
    SessionReloaded {
        remove_existing_anchors: bool,
        planes_hidden: bool,
    },
}

/// Result of a touch-began
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchOutcome {
    Placed(ObjectId),
    Selection(SelectionChange),
}

/// Placement engine instance
#[derive(Debug, Clone)]
pub struct Session {
    config: PlacementConfig,
    placement_mode: PlacementMode,
    manipulation_mode: ManipulationMode,
    templates: TemplateLibrary,
    selected_template: Option<TemplateId>,
    store: ObjectStore,
    registry: AnchorRegistry,
    ids: NodeIdAllocator,
    events: Vec<SceneEvent>,
}

impl Default for Session {
    fn default() -> Self {
        Self::with_valid_config(PlacementConfig::default())
    }
}

impl Session {
    /// Create a session after validating `config`
    pub fn new(config: PlacementConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: PlacementConfig) -> Self {
        let registry = AnchorRegistry::new(
            config.planes_hidden_by_default,
            config.surface_opacity,
            config.image_cover_opacity,
        );
        Self {
            config,
            placement_mode: PlacementMode::default(),
            manipulation_mode: ManipulationMode::default(),
            templates: TemplateLibrary::new(),
            selected_template: None,
            store: ObjectStore::new(),
            registry,
            ids: NodeIdAllocator::new(),
            events: Vec::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Modes and templates
    // ------------------------------------------------------------------------

    /// Switch placement mode
    ///
    /// Always drops the current highlight. Surface visuals are shown in plane
    /// mode and hidden in every other mode.
    pub fn set_placement_mode(&mut self, mode: PlacementMode) {
        info!("Placement mode: {:?} -> {:?}", self.placement_mode, mode);
        self.placement_mode = mode;
        self.set_highlighted(None);
        self.set_surfaces_hidden(!mode.shows_surfaces());
    }

    pub fn set_manipulation_mode(&mut self, mode: ManipulationMode) {
        debug!("Manipulation mode: {:?}", mode);
        self.manipulation_mode = mode;
    }

    /// Add or replace a template in the library
    pub fn register_template(&mut self, template: Template) {
        self.templates.register(template);
    }

    /// Choose the template the next creation touch clones
    pub fn select_template(&mut self, id: TemplateId) -> Result<()> {
        if !self.templates.contains(&id) {
            return Err(PlacementError::UnknownTemplate(id));
        }
        debug!("Selected template {}", id);
        self.selected_template = Some(id);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Touch input
    // ------------------------------------------------------------------------

    /// Handle the start of a touch
    ///
    /// Creates an object in creation modes, toggles the target in transform
    /// mode.
    pub fn on_touch_began(
        &mut self,
        point: Vec2,
        tracking: &dyn TrackingProvider,
    ) -> Result<TouchOutcome> {
        if !self.placement_mode.creates_objects() {
            let hits = tracking.hit_test_all_nodes(point);
            let change = toggle_target(&hits, &self.registry, &mut self.store);
            match change {
                SelectionChange::Highlighted { current, previous } => {
                    self.events.push(SceneEvent::HighlightChanged {
                        current: Some(current),
                        previous,
                    });
                }
                SelectionChange::Cleared(previous) => {
                    self.events.push(SceneEvent::HighlightChanged {
                        current: None,
                        previous: Some(previous),
                    });
                }
                SelectionChange::Unchanged => {}
            }
            return Ok(TouchOutcome::Selection(change));
        }

        let template_id = self
            .selected_template
            .as_ref()
            .ok_or(PlacementError::NoTemplateSelected)?;
        let template = self
            .templates
            .get(template_id)
            .ok_or_else(|| PlacementError::UnknownTemplate(template_id.clone()))?;

        let pose = resolve_pose(
            self.placement_mode,
            point,
            tracking,
            self.config.forward_offset,
        )?;

        let object = self.store.append(pose, template, &mut self.ids).clone();
        info!(
            "Placed {} ({}) in {:?} mode",
            object.id, object.template, self.placement_mode
        );
        let id = object.id;
        self.events.push(SceneEvent::ObjectAdded(object));
        Ok(TouchOutcome::Placed(id))
    }

    /// Handle one touch-move sample
    ///
    /// Returns the object whose pose changed.
    pub fn on_touch_moved(
        &mut self,
        point: Vec2,
        previous: Vec2,
        tracking: &dyn TrackingProvider,
    ) -> Result<ObjectId> {
        let plan = DragPlan::for_modes(self.placement_mode, self.manipulation_mode)?;
        let target = match plan.target {
            DragTarget::LastPlaced => self.store.last().map(|o| o.id),
            DragTarget::Highlighted => self.store.highlighted_id(),
        }
        .ok_or(PlacementError::NoTarget)?;

        if plan.requires_tracking() && !tracking.is_tracking() {
            return Err(PlacementError::TrackingUnavailable);
        }

        let damping = plan.damping(&self.config.damping)?;
        let object = self.store.get_mut(target).ok_or(PlacementError::NoTarget)?;
        let pose = manipulation::apply(plan.operation, object.pose, point - previous, damping)?;
        object.pose = pose;

        debug!("{:?} {} -> {}", plan.operation, target, pose.w_axis.truncate());
        self.events
            .push(SceneEvent::ObjectPoseChanged { id: target, pose });
        Ok(target)
    }

    // ------------------------------------------------------------------------
    // Menu actions
    // ------------------------------------------------------------------------

    /// Remove the most recently placed object
    ///
    /// `None` when nothing is placed; the UI closes its menu instead.
    pub fn undo(&mut self) -> Option<PlacedObject> {
        let was_highlighted = self.store.highlighted_id();
        let removed = self.store.remove_last()?;

        if was_highlighted == Some(removed.id) {
            self.events.push(SceneEvent::HighlightChanged {
                current: None,
                previous: Some(removed.id),
            });
        }
        self.events.push(SceneEvent::ObjectRemoved {
            id: removed.id,
            root_node: removed.root_node,
        });
        info!("Undo removed {}", removed.id);
        Some(removed)
    }

    /// Initial session run; keeps anchors the tracker already knows
    pub fn start(&mut self) {
        self.reload(false);
    }

    /// Drop every object and visual and ask the tracker to forget its anchors
    pub fn reset(&mut self) {
        self.reload(true);
    }

    fn reload(&mut self, remove_existing_anchors: bool) {
        let objects = self.store.clear();
        self.registry.clear();
        let planes_hidden = self.config.planes_hidden_by_default;
        self.registry.set_all_surfaces_hidden(planes_hidden);

        info!(
            "Session reloaded ({} objects cleared, remove_existing_anchors={})",
            objects.len(),
            remove_existing_anchors
        );
        self.events.push(SceneEvent::SessionReloaded {
            remove_existing_anchors,
            planes_hidden,
        });
    }

    /// Flip surface visibility
    ///
    /// Only acts in plane mode. Returns the resulting hidden flag.
    pub fn toggle_surface_visibility(&mut self) -> bool {
        if self.placement_mode != PlacementMode::Plane {
            debug!("Surface toggle ignored in {:?} mode", self.placement_mode);
            return self.registry.planes_hidden();
        }
        let hidden = !self.registry.planes_hidden();
        self.set_surfaces_hidden(hidden);
        hidden
    }

    // ------------------------------------------------------------------------
    // Anchor callbacks
    // ------------------------------------------------------------------------

    /// Apply an anchor lifecycle callback from the tracker
    pub fn apply_anchor_event(&mut self, event: AnchorEvent) -> Result<()> {
        match event {
            AnchorEvent::Surface(SurfaceAnchorEvent::Added {
                anchor_id,
                extent,
                center,
            }) => {
                let existed = self.registry.surface(anchor_id).is_some();
                let visual = self
                    .registry
                    .on_surface_detected(anchor_id, extent, center, &mut self.ids)?
                    .clone();
                self.events.push(if existed {
                    SceneEvent::SurfaceVisualUpdated(visual)
                } else {
                    SceneEvent::SurfaceVisualAdded(visual)
                });
            }
            AnchorEvent::Surface(SurfaceAnchorEvent::Updated {
                anchor_id,
                extent,
                center,
            }) => {
                let visual = self
                    .registry
                    .on_surface_updated(anchor_id, extent, center)?
                    .clone();
                self.events.push(SceneEvent::SurfaceVisualUpdated(visual));
            }
            AnchorEvent::Surface(SurfaceAnchorEvent::Removed { anchor_id }) => {
                let visual = self.registry.on_surface_removed(anchor_id)?;
                self.events.push(SceneEvent::SurfaceVisualRemoved {
                    anchor_id,
                    node_id: visual.node_id,
                });
            }
            AnchorEvent::Image(ImageAnchorEvent::Added { anchor_id, size }) => {
                let existed = self.registry.image(anchor_id).is_some();
                let visual = self
                    .registry
                    .on_image_detected(anchor_id, size, &mut self.ids)?
                    .clone();
                if !existed {
                    self.events.push(SceneEvent::ImageVisualAdded(visual));
                }
            }
            AnchorEvent::Image(ImageAnchorEvent::Updated { anchor_id }) => {
                debug!("Image {} updated, cover unchanged", anchor_id);
            }
            AnchorEvent::Unknown { anchor_id, kind } => {
                warn!("Unknown anchor type {} for {}", kind, anchor_id);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn placed_objects(&self) -> &[PlacedObject] {
        self.store.as_slice()
    }

    pub fn highlighted_object(&self) -> Option<&PlacedObject> {
        self.store.highlighted()
    }

    pub fn surface_visuals(&self) -> &[SurfaceAnchorVisual] {
        self.registry.surfaces()
    }

    pub fn image_visuals(&self) -> &[ImageAnchorVisual] {
        self.registry.images()
    }

    pub fn placement_mode(&self) -> PlacementMode {
        self.placement_mode
    }

    pub fn manipulation_mode(&self) -> ManipulationMode {
        self.manipulation_mode
    }

    pub fn selected_template(&self) -> Option<&TemplateId> {
        self.selected_template.as_ref()
    }

    pub fn templates(&self) -> &TemplateLibrary {
        &self.templates
    }

    pub fn planes_hidden(&self) -> bool {
        self.registry.planes_hidden()
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Resolve a hit node to the placed object owning it
    pub fn find_parent_owning(&self, node: NodeId) -> Option<ObjectId> {
        self.store.find_parent_owning(node)
    }

    /// Events queued since the last drain
    pub fn pending_events(&self) -> &[SceneEvent] {
        &self.events
    }

    /// Take every queued event, oldest first
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------------
    // Internal setters
    // ------------------------------------------------------------------------

    fn set_highlighted(&mut self, target: Option<ObjectId>) {
        let previous = self.store.set_highlighted(target);
        let current = self.store.highlighted_id();
        if previous != current {
            self.events
                .push(SceneEvent::HighlightChanged { current, previous });
        }
    }

    fn set_surfaces_hidden(&mut self, hidden: bool) {
        if self.registry.planes_hidden() == hidden {
            return;
        }
        self.registry.set_all_surfaces_hidden(hidden);
        self.events
            .push(SceneEvent::SurfaceVisibilityChanged { hidden });
    }
}
