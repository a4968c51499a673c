//! Anchor registry
//!
//! Tracks the virtual helper geometry standing in for anchors reported by the
//! external tracking system:
//!
//! - [`SurfaceAnchorVisual`]: a translucent floor quad per horizontal surface,
//!   resized whenever the tracker refines the surface
//! - [`ImageAnchorVisual`]: a near-invisible cover over each recognised image,
//!   used only as a placement target
//!
//! Tracking callbacks may race with anchor removal, so updates for unknown ids
//! and malformed geometry are logged and dropped instead of propagated.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::error::{PlacementError, Result};
use crate::node::{NodeId, NodeIdAllocator};

/// Identifier assigned by the tracking system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnchorId(pub u64);

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "anchor#{}", self.0)
    }
}

/// Anchor classification reported alongside raycast hits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorKind {
    HorizontalSurface,
    VerticalSurface,
    Image,
    Other,
}

/// Horizontal extent of a detected surface in metres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceExtent {
    pub width: f32,
    pub depth: f32,
}

impl SurfaceExtent {
    pub fn new(width: f32, depth: f32) -> Self {
        Self { width, depth }
    }
}

/// Physical size of a recognised reference image in metres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalSize {
    pub width: f32,
    pub height: f32,
}

impl PhysicalSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Floor quad mirroring one live surface anchor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceAnchorVisual {
    pub anchor_id: AnchorId,
    pub node_id: NodeId,
    pub width: f32,
    pub depth: f32,
    /// Offset of the quad centre within the anchor's frame
    pub center: Vec3,
    pub hidden: bool,
    pub opacity: f32,
}

/// Cover quad over one recognised image
///
/// Never shown; it exists so hit-tests can land on the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnchorVisual {
    pub anchor_id: AnchorId,
    pub node_id: NodeId,
    pub width: f32,
    pub height: f32,
    pub opacity: f32,
}

/// Surface anchor lifecycle as delivered by the tracker
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceAnchorEvent {
    Added {
        anchor_id: AnchorId,
        extent: SurfaceExtent,
        center: Vec3,
    },
    Updated {
        anchor_id: AnchorId,
        extent: SurfaceExtent,
        center: Vec3,
    },
    Removed {
        anchor_id: AnchorId,
    },
}

/// Image anchor lifecycle as delivered by the tracker
#[derive(Debug, Clone, PartialEq)]
pub enum ImageAnchorEvent {
    Added {
        anchor_id: AnchorId,
        size: PhysicalSize,
    },
    /// Image anchors keep their cover as first sized
    Updated { anchor_id: AnchorId },
}

/// Any anchor callback from the tracking system
#[derive(Debug, Clone, PartialEq)]
pub enum AnchorEvent {
    Surface(SurfaceAnchorEvent),
    Image(ImageAnchorEvent),
    /// Anchor of a type the engine does not represent
    Unknown { anchor_id: AnchorId, kind: String },
}

fn validate_surface(extent: SurfaceExtent, center: Vec3) -> Result<()> {
    let extent_ok = extent.width.is_finite()
        && extent.depth.is_finite()
        && extent.width >= 0.0
        && extent.depth >= 0.0;
    if !extent_ok {
        return Err(PlacementError::InvalidGeometry(format!(
            "surface extent {} x {}",
            extent.width, extent.depth
        )));
    }
    if !center.is_finite() {
        return Err(PlacementError::InvalidGeometry(format!(
            "surface center {center}"
        )));
    }
    Ok(())
}

fn validate_image(size: PhysicalSize) -> Result<()> {
    if size.width.is_finite() && size.height.is_finite() && size.width >= 0.0 && size.height >= 0.0
    {
        Ok(())
    } else {
        Err(PlacementError::InvalidGeometry(format!(
            "image size {} x {}",
            size.width, size.height
        )))
    }
}

/// Registry of helper visuals keyed by anchor id
#[derive(Debug, Clone)]
pub struct AnchorRegistry {
    surfaces: Vec<SurfaceAnchorVisual>,
    images: Vec<ImageAnchorVisual>,
    planes_hidden: bool,
    surface_opacity: f32,
    image_cover_opacity: f32,
}

impl AnchorRegistry {
    /// Empty registry
    ///
    /// New surface visuals copy `planes_hidden` at the time they are detected.
    pub fn new(planes_hidden: bool, surface_opacity: f32, image_cover_opacity: f32) -> Self {
        Self {
            surfaces: Vec::new(),
            images: Vec::new(),
            planes_hidden,
            surface_opacity,
            image_cover_opacity,
        }
    }

    /// Register a newly detected surface
    ///
    /// A second detection for an id that is already registered is treated as
    /// an update of that visual.
    pub fn on_surface_detected(
        &mut self,
        anchor_id: AnchorId,
        extent: SurfaceExtent,
        center: Vec3,
        ids: &mut NodeIdAllocator,
    ) -> Result<&SurfaceAnchorVisual> {
        if let Err(err) = validate_surface(extent, center) {
            warn!("Dropping surface detection for {}: {}", anchor_id, err);
            return Err(err);
        }

        if let Some(index) = self.surface_index(anchor_id) {
            debug!("Surface {} detected twice, updating in place", anchor_id);
            let visual = &mut self.surfaces[index];
            visual.width = extent.width;
            visual.depth = extent.depth;
            visual.center = center;
            return Ok(&self.surfaces[index]);
        }

        let visual = SurfaceAnchorVisual {
            anchor_id,
            node_id: ids.allocate(),
            width: extent.width,
            depth: extent.depth,
            center,
            hidden: self.planes_hidden,
            opacity: self.surface_opacity,
        };
        debug!(
            "Surface {} added ({} x {}, hidden={})",
            anchor_id, extent.width, extent.depth, visual.hidden
        );
        self.surfaces.push(visual);
        Ok(&self.surfaces[self.surfaces.len() - 1])
    }

    /// Resize and re-centre an existing surface visual
    pub fn on_surface_updated(
        &mut self,
        anchor_id: AnchorId,
        extent: SurfaceExtent,
        center: Vec3,
    ) -> Result<&SurfaceAnchorVisual> {
        let Some(index) = self.surface_index(anchor_id) else {
            warn!("Ignoring update for unknown surface {}", anchor_id);
            return Err(PlacementError::UnknownAnchorId(anchor_id));
        };
        if let Err(err) = validate_surface(extent, center) {
            warn!("Dropping surface update for {}: {}", anchor_id, err);
            return Err(err);
        }

        let visual = &mut self.surfaces[index];
        visual.width = extent.width;
        visual.depth = extent.depth;
        visual.center = center;
        Ok(&self.surfaces[index])
    }

    /// Drop the visual for a surface the tracker no longer reports
    pub fn on_surface_removed(&mut self, anchor_id: AnchorId) -> Result<SurfaceAnchorVisual> {
        match self.surface_index(anchor_id) {
            Some(index) => Ok(self.surfaces.remove(index)),
            None => {
                warn!("Ignoring removal of unknown surface {}", anchor_id);
                Err(PlacementError::UnknownAnchorId(anchor_id))
            }
        }
    }

    /// Register the cover for a recognised image
    ///
    /// Repeated detections of the same image keep the first cover.
    pub fn on_image_detected(
        &mut self,
        anchor_id: AnchorId,
        size: PhysicalSize,
        ids: &mut NodeIdAllocator,
    ) -> Result<&ImageAnchorVisual> {
        if let Err(err) = validate_image(size) {
            warn!("Dropping image detection for {}: {}", anchor_id, err);
            return Err(err);
        }

        if let Some(index) = self.images.iter().position(|v| v.anchor_id == anchor_id) {
            debug!("Image {} already registered", anchor_id);
            return Ok(&self.images[index]);
        }

        self.images.push(ImageAnchorVisual {
            anchor_id,
            node_id: ids.allocate(),
            width: size.width,
            height: size.height,
            opacity: self.image_cover_opacity,
        });
        debug!("Image {} added ({} x {})", anchor_id, size.width, size.height);
        Ok(&self.images[self.images.len() - 1])
    }

    /// Apply one visibility flag to every surface visual, and to future ones
    pub fn set_all_surfaces_hidden(&mut self, hidden: bool) {
        self.planes_hidden = hidden;
        for visual in &mut self.surfaces {
            visual.hidden = hidden;
        }
    }

    pub fn planes_hidden(&self) -> bool {
        self.planes_hidden
    }

    /// Remove every visual; the visibility flag is left untouched
    pub fn clear(&mut self) {
        self.surfaces.clear();
        self.images.clear();
    }

    pub fn surface(&self, anchor_id: AnchorId) -> Option<&SurfaceAnchorVisual> {
        self.surfaces.iter().find(|v| v.anchor_id == anchor_id)
    }

    pub fn image(&self, anchor_id: AnchorId) -> Option<&ImageAnchorVisual> {
        self.images.iter().find(|v| v.anchor_id == anchor_id)
    }

    pub fn surfaces(&self) -> &[SurfaceAnchorVisual] {
        &self.surfaces
    }

    pub fn images(&self) -> &[ImageAnchorVisual] {
        &self.images
    }

    /// True if `node` is a floor quad or image cover owned by this registry
    pub fn is_helper_node(&self, node: NodeId) -> bool {
        self.surfaces.iter().any(|v| v.node_id == node)
            || self.images.iter().any(|v| v.node_id == node)
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty() && self.images.is_empty()
    }

    fn surface_index(&self, anchor_id: AnchorId) -> Option<usize> {
        self.surfaces.iter().position(|v| v.anchor_id == anchor_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (AnchorRegistry, NodeIdAllocator) {
        (AnchorRegistry::new(true, 0.25, 0.01), NodeIdAllocator::new())
    }

    #[test]
    fn test_surface_detected_copies_hidden_flag() {
        let (mut reg, mut ids) = registry();
        let v = reg
            .on_surface_detected(AnchorId(1), SurfaceExtent::new(1.0, 2.0), Vec3::ZERO, &mut ids)
            .unwrap();
        assert!(v.hidden);
        assert_eq!(v.opacity, 0.25);

        reg.set_all_surfaces_hidden(false);
        let v = reg
            .on_surface_detected(AnchorId(2), SurfaceExtent::new(1.0, 1.0), Vec3::ZERO, &mut ids)
            .unwrap();
        assert!(!v.hidden);
        assert!(reg.surfaces().iter().all(|v| !v.hidden));
    }

    #[test]
    fn test_surface_update_changes_geometry() {
        let (mut reg, mut ids) = registry();
        reg.on_surface_detected(AnchorId(1), SurfaceExtent::new(1.0, 1.0), Vec3::ZERO, &mut ids)
            .unwrap();
        reg.on_surface_updated(
            AnchorId(1),
            SurfaceExtent::new(3.0, 4.0),
            Vec3::new(0.5, 0.0, -0.5),
        )
        .unwrap();

        let v = reg.surface(AnchorId(1)).unwrap();
        assert_eq!((v.width, v.depth), (3.0, 4.0));
        assert_eq!(v.center, Vec3::new(0.5, 0.0, -0.5));
    }

    #[test]
    fn test_unknown_update_is_noop() {
        let (mut reg, mut ids) = registry();
        reg.on_surface_detected(AnchorId(1), SurfaceExtent::new(1.0, 2.0), Vec3::ZERO, &mut ids)
            .unwrap();
        let before = reg.surfaces().to_vec();

        let result = reg.on_surface_updated(AnchorId(99), SurfaceExtent::new(5.0, 5.0), Vec3::ONE);
        assert!(matches!(result, Err(PlacementError::UnknownAnchorId(AnchorId(99)))));
        assert_eq!(reg.surfaces(), before.as_slice());
    }

    #[test]
    fn test_malformed_update_is_rejected() {
        let (mut reg, mut ids) = registry();
        reg.on_surface_detected(AnchorId(1), SurfaceExtent::new(1.0, 2.0), Vec3::ZERO, &mut ids)
            .unwrap();

        for (extent, center) in [
            (SurfaceExtent::new(f32::NAN, 1.0), Vec3::ZERO),
            (SurfaceExtent::new(1.0, -1.0), Vec3::ZERO),
            (SurfaceExtent::new(1.0, f32::INFINITY), Vec3::ZERO),
            (SurfaceExtent::new(1.0, 1.0), Vec3::new(0.0, f32::NAN, 0.0)),
        ] {
            let result = reg.on_surface_updated(AnchorId(1), extent, center);
            assert!(matches!(result, Err(PlacementError::InvalidGeometry(_))));
        }

        let v = reg.surface(AnchorId(1)).unwrap();
        assert_eq!((v.width, v.depth), (1.0, 2.0));
    }

    #[test]
    fn test_duplicate_detection_updates() {
        let (mut reg, mut ids) = registry();
        let first = reg
            .on_surface_detected(AnchorId(1), SurfaceExtent::new(1.0, 1.0), Vec3::ZERO, &mut ids)
            .unwrap()
            .node_id;
        let second = reg
            .on_surface_detected(AnchorId(1), SurfaceExtent::new(2.0, 2.0), Vec3::ZERO, &mut ids)
            .unwrap();
        assert_eq!(second.node_id, first);
        assert_eq!(second.width, 2.0);
        assert_eq!(reg.surfaces().len(), 1);
    }

    #[test]
    fn test_surface_removed() {
        let (mut reg, mut ids) = registry();
        reg.on_surface_detected(AnchorId(1), SurfaceExtent::new(1.0, 1.0), Vec3::ZERO, &mut ids)
            .unwrap();
        assert!(reg.on_surface_removed(AnchorId(1)).is_ok());
        assert!(reg.on_surface_removed(AnchorId(1)).is_err());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_image_detected_once() {
        let (mut reg, mut ids) = registry();
        let node = reg
            .on_image_detected(AnchorId(5), PhysicalSize::new(0.2, 0.3), &mut ids)
            .unwrap()
            .node_id;
        reg.on_image_detected(AnchorId(5), PhysicalSize::new(9.0, 9.0), &mut ids)
            .unwrap();

        assert_eq!(reg.images().len(), 1);
        let v = reg.image(AnchorId(5)).unwrap();
        assert_eq!(v.node_id, node);
        assert_eq!(v.width, 0.2);
        assert_eq!(v.opacity, 0.01);
        assert!(reg.is_helper_node(node));
    }

    #[test]
    fn test_clear_keeps_flag() {
        let (mut reg, mut ids) = registry();
        reg.set_all_surfaces_hidden(false);
        reg.on_surface_detected(AnchorId(1), SurfaceExtent::new(1.0, 1.0), Vec3::ZERO, &mut ids)
            .unwrap();
        reg.on_image_detected(AnchorId(2), PhysicalSize::new(0.1, 0.1), &mut ids)
            .unwrap();
        reg.clear();
        assert!(reg.is_empty());
        assert!(!reg.planes_hidden());
    }
}
