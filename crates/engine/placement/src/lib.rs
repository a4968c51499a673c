//! AR object placement engine
//!
//! Decides where a virtual object lands when the user touches the screen,
//! how later drags move, rotate, or scale it, and which detected surfaces and
//! images get helper visuals. Camera tracking and rendering stay with the
//! host: it answers queries through [`TrackingProvider`] and mirrors state
//! changes by draining [`SceneEvent`]s from the [`Session`].
//!
//! # Modules
//!
//! - [`transform`]: Pose composition primitives and damping
//! - [`placement`]: Creation pose per placement mode
//! - [`manipulation`]: Drag-driven move, rotate and scale
//! - [`selection`]: Transform-mode targeting with toggle semantics
//! - [`store`]: Placed objects, undo order and highlight
//! - [`anchor`]: Surface and image anchor visuals
//! - [`session`]: Modes, menu actions and the scene event queue
//! - [`gesture`]: Primary-touch routing
//! - [`shared`]: Lock-protected session handle
//! - [`config`]: TOML configuration
//!
//! # Example
//!
//! ```
//! use glam::{Mat4, Vec2};
//! use placement::{Session, StaticTracking, Template};
//!
//! let mut session = Session::default();
//! session.register_template(Template::new("chair"));
//! session.select_template("chair".into()).unwrap();
//!
//! let tracking = StaticTracking::new().with_camera(Mat4::IDENTITY);
//! session.on_touch_began(Vec2::new(200.0, 400.0), &tracking).unwrap();
//! assert_eq!(session.placed_objects().len(), 1);
//! ```

pub mod anchor;
pub mod config;
pub mod error;
pub mod gesture;
pub mod manipulation;
pub mod node;
pub mod placement;
pub mod selection;
pub mod session;
pub mod shared;
pub mod store;
pub mod template;
pub mod tracking;
pub mod transform;

// Re-export commonly used types at crate root
pub use anchor::{
    AnchorEvent, AnchorId, AnchorKind, AnchorRegistry, ImageAnchorEvent, ImageAnchorVisual,
    PhysicalSize, SurfaceAnchorEvent, SurfaceAnchorVisual, SurfaceExtent,
};
pub use config::{DampingConfig, PlacementConfig};
pub use error::{PlacementError, Result};
pub use gesture::{GestureOutcome, TouchPhase, TouchPoint, TouchTracker};
pub use manipulation::{DragPlan, ManipulationMode};
pub use node::{NodeId, FLOOR_NODE_NAME, IMAGE_NODE_NAME};
pub use placement::PlacementMode;
pub use selection::SelectionChange;
pub use session::{SceneEvent, Session, TouchOutcome};
pub use shared::SharedSession;
pub use store::{ObjectId, PlacedObject};
pub use template::{Template, TemplateId, TemplateLibrary};
pub use tracking::{NodeHit, StaticTracking, SurfaceHit, TrackingProvider};
pub use transform::Damping;
