//! Hit/selection targeting
//!
//! In transform mode a tap picks the object to manipulate. The renderer's
//! hit-test reports every node under the finger, floor quads and image covers
//! included, so helper geometry is skipped before the first real hit is mapped
//! back to its owning object.

use tracing::debug;

use crate::anchor::AnchorRegistry;
use crate::node::{FLOOR_NODE_NAME, IMAGE_NODE_NAME};
use crate::store::{ObjectId, ObjectStore};
use crate::tracking::NodeHit;

/// Outcome of a targeting tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    /// `current` became the target, replacing `previous` if any
    Highlighted {
        current: ObjectId,
        previous: Option<ObjectId>,
    },
    /// The tapped object was already the target and was deselected
    Cleared(ObjectId),
    /// Nothing targetable under the finger
    Unchanged,
}

/// True for floor and image helper geometry
pub fn is_helper_hit(hit: &NodeHit, registry: &AnchorRegistry) -> bool {
    hit.node_name == FLOOR_NODE_NAME
        || hit.node_name == IMAGE_NODE_NAME
        || registry.is_helper_node(hit.node_id)
}

/// Resolve the first non-helper hit to its owning placed object
pub fn resolve_target(
    hits: &[NodeHit],
    registry: &AnchorRegistry,
    store: &ObjectStore,
) -> Option<ObjectId> {
    let hit = hits.iter().find(|hit| !is_helper_hit(hit, registry))?;
    let owner = store.find_parent_owning(hit.node_id);
    if owner.is_none() {
        debug!("Hit {} ({}) is not part of a placed object", hit.node_id, hit.node_name);
    }
    owner
}

/// Toggle the highlight on whatever the hits resolve to
///
/// Tapping the current target deselects it; tapping anything else moves the
/// highlight there.
pub fn toggle_target(
    hits: &[NodeHit],
    registry: &AnchorRegistry,
    store: &mut ObjectStore,
) -> SelectionChange {
    let Some(target) = resolve_target(hits, registry, store) else {
        return SelectionChange::Unchanged;
    };

    if store.highlighted_id() == Some(target) {
        store.set_highlighted(None);
        debug!("Deselected {}", target);
        SelectionChange::Cleared(target)
    } else {
        let previous = store.set_highlighted(Some(target));
        debug!("Selected {}", target);
        SelectionChange::Highlighted {
            current: target,
            previous,
        }
    }
}
