//! Touch gesture routing
//!
//! Hosts forward raw touch events here. Only the primary finger drives the
//! engine; additional fingers are tracked so the primary can be identified
//! but never reach the session.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::{Session, TouchOutcome};
use crate::store::ObjectId;
use crate::tracking::TrackingProvider;

/// Touch event phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchPhase {
    /// A finger touched the screen
    Started,
    /// A finger moved on the screen
    Moved,
    /// A finger was lifted from the screen
    Ended,
    /// The system took the touch away
    Cancelled,
}

/// A single touch sample in view coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub id: u64,
    pub position: Vec2,
    /// Position of the previous sample, equal to `position` on start
    pub previous_position: Vec2,
    pub phase: TouchPhase,
}

impl TouchPoint {
    pub fn new(id: u64, position: Vec2, phase: TouchPhase) -> Self {
        Self {
            id,
            position,
            previous_position: position,
            phase,
        }
    }

    /// Movement since the previous sample
    pub fn delta(&self) -> Vec2 {
        self.position - self.previous_position
    }
}

/// What a routed touch did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    Began(TouchOutcome),
    Moved(ObjectId),
    Ended,
    /// Secondary finger or a sample for a touch that is not active
    Ignored,
}

/// Primary-touch tracker
#[derive(Debug, Clone, Default)]
pub struct TouchTracker {
    primary: Option<TouchPoint>,
    secondary: Vec<u64>,
}

impl TouchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route one touch sample to `session`
    ///
    /// Previous positions come from the tracker, not the sample, so hosts that
    /// only report current positions still produce correct deltas.
    pub fn handle(
        &mut self,
        session: &mut Session,
        touch: TouchPoint,
        tracking: &dyn TrackingProvider,
    ) -> Result<GestureOutcome> {
        match touch.phase {
            TouchPhase::Started => {
                if self.primary.is_some() {
                    self.secondary.push(touch.id);
                    return Ok(GestureOutcome::Ignored);
                }
                self.primary = Some(TouchPoint::new(touch.id, touch.position, TouchPhase::Started));
                let outcome = session.on_touch_began(touch.position, tracking)?;
                Ok(GestureOutcome::Began(outcome))
            }
            TouchPhase::Moved => {
                let Some(primary) = self.primary.as_mut().filter(|p| p.id == touch.id) else {
                    return Ok(GestureOutcome::Ignored);
                };
                primary.previous_position = primary.position;
                primary.position = touch.position;
                primary.phase = TouchPhase::Moved;
                let (point, previous) = (primary.position, primary.previous_position);

                let id = session.on_touch_moved(point, previous, tracking)?;
                Ok(GestureOutcome::Moved(id))
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                if self.primary.is_some_and(|p| p.id == touch.id) {
                    self.primary = None;
                    return Ok(GestureOutcome::Ended);
                }
                self.secondary.retain(|id| *id != touch.id);
                Ok(GestureOutcome::Ignored)
            }
        }
    }

    pub fn primary(&self) -> Option<&TouchPoint> {
        self.primary.as_ref()
    }

    pub fn is_touching(&self) -> bool {
        self.primary.is_some()
    }

    pub fn touch_count(&self) -> usize {
        usize::from(self.primary.is_some()) + self.secondary.len()
    }

    pub fn clear(&mut self) {
        self.primary = None;
        self.secondary.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Template;
    use crate::tracking::StaticTracking;
    use glam::Mat4;

    fn session() -> Session {
        let mut session = Session::default();
        session.register_template(Template::new("cube"));
        session.select_template("cube".into()).unwrap();
        session
    }

    #[test]
    fn test_touch_point_delta() {
        let mut touch = TouchPoint::new(1, Vec2::new(100.0, 100.0), TouchPhase::Started);
        assert_eq!(touch.delta(), Vec2::ZERO);

        touch.previous_position = touch.position;
        touch.position = Vec2::new(150.0, 120.0);
        assert_eq!(touch.delta(), Vec2::new(50.0, 20.0));
    }

    #[test]
    fn test_primary_touch_drives_session() {
        let mut session = session();
        let mut tracker = TouchTracker::new();
        let tracking = StaticTracking::new().with_camera(Mat4::IDENTITY);

        let began = tracker
            .handle(
                &mut session,
                TouchPoint::new(1, Vec2::new(10.0, 10.0), TouchPhase::Started),
                &tracking,
            )
            .unwrap();
        assert!(matches!(began, GestureOutcome::Began(TouchOutcome::Placed(_))));

        let before = session.placed_objects()[0].pose;
        tracker
            .handle(
                &mut session,
                TouchPoint::new(1, Vec2::new(60.0, 10.0), TouchPhase::Moved),
                &tracking,
            )
            .unwrap();
        let after = session.placed_objects()[0].pose;
        let expected = before * Mat4::from_rotation_x(50.0 / 50.0);
        assert!(after.abs_diff_eq(expected, 1e-5));

        let ended = tracker
            .handle(
                &mut session,
                TouchPoint::new(1, Vec2::new(60.0, 10.0), TouchPhase::Ended),
                &tracking,
            )
            .unwrap();
        assert_eq!(ended, GestureOutcome::Ended);
        assert!(!tracker.is_touching());
    }

    #[test]
    fn test_secondary_touch_ignored() {
        let mut session = session();
        let mut tracker = TouchTracker::new();
        let tracking = StaticTracking::new().with_camera(Mat4::IDENTITY);

        tracker
            .handle(&mut session, TouchPoint::new(1, Vec2::ZERO, TouchPhase::Started), &tracking)
            .unwrap();
        let second = tracker
            .handle(&mut session, TouchPoint::new(2, Vec2::ONE, TouchPhase::Started), &tracking)
            .unwrap();
        assert_eq!(second, GestureOutcome::Ignored);
        assert_eq!(tracker.touch_count(), 2);
        assert_eq!(session.placed_objects().len(), 1);

        let moved = tracker
            .handle(&mut session, TouchPoint::new(2, Vec2::ZERO, TouchPhase::Moved), &tracking)
            .unwrap();
        assert_eq!(moved, GestureOutcome::Ignored);

        tracker
            .handle(&mut session, TouchPoint::new(2, Vec2::ONE, TouchPhase::Ended), &tracking)
            .unwrap();
        assert_eq!(tracker.touch_count(), 1);
    }

    #[test]
    fn test_failed_begin_still_tracks_touch() {
        let mut session = Session::default();
        let mut tracker = TouchTracker::new();
        let tracking = StaticTracking::new();

        let result =
            tracker.handle(&mut session, TouchPoint::new(1, Vec2::ZERO, TouchPhase::Started), &tracking);
        assert!(result.is_err());
        assert!(tracker.is_touching());
    }
}
