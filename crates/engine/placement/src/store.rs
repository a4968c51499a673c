//! Object store
//!
//! Arena of placed objects in insertion order. Insertion order doubles as undo
//! order, so [`ObjectStore::remove_last`] is strict LIFO.
//!
//! Each object owns a root scene node plus one node per template part. A node
//! index maps every one of those ids back to its owner, which turns "which
//! object did the hit-test land on" into a single lookup.

use glam::Mat4;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::node::{NodeId, NodeIdAllocator};
use crate::template::{Template, TemplateId};

/// Identifier of a placed object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

/// A template clone living in the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedObject {
    pub id: ObjectId,
    /// Scene node the renderer attaches to the scene root
    pub root_node: NodeId,
    /// Child nodes, one per template part, in template order
    pub parts: Vec<NodeId>,
    /// World-space pose
    pub pose: Mat4,
    pub template: TemplateId,
    /// True while this object is the manipulation target
    pub highlighted: bool,
}

impl PlacedObject {
    /// True if `node` is this object's root or one of its parts
    pub fn owns_node(&self, node: NodeId) -> bool {
        self.root_node == node || self.parts.contains(&node)
    }

    fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::once(self.root_node).chain(self.parts.iter().copied())
    }
}

/// Ordered collection of placed objects
#[derive(Debug, Clone, Default)]
pub struct ObjectStore {
    objects: Vec<PlacedObject>,
    node_index: HashMap<NodeId, ObjectId>,
    highlighted: Option<ObjectId>,
    next_id: u64,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone `template` at `pose`; the clone becomes the last object
    pub fn append(
        &mut self,
        pose: Mat4,
        template: &Template,
        ids: &mut NodeIdAllocator,
    ) -> &PlacedObject {
        let id = ObjectId(self.next_id);
        self.next_id += 1;

        let object = PlacedObject {
            id,
            root_node: ids.allocate(),
            parts: template.parts.iter().map(|_| ids.allocate()).collect(),
            pose,
            template: template.id.clone(),
            highlighted: false,
        };
        for node in object.nodes() {
            self.node_index.insert(node, id);
        }

        debug!("Appended {} from template {}", id, template.id);
        self.objects.push(object);
        &self.objects[self.objects.len() - 1]
    }

    /// Undo the most recent placement
    ///
    /// Returns `None` on an empty store.
    pub fn remove_last(&mut self) -> Option<PlacedObject> {
        let mut object = self.objects.pop()?;
        self.unindex(&object);
        if self.highlighted == Some(object.id) {
            self.highlighted = None;
            object.highlighted = false;
        }
        debug!("Removed {}", object.id);
        Some(object)
    }

    /// Remove every object, returning them in insertion order
    pub fn clear(&mut self) -> Vec<PlacedObject> {
        self.node_index.clear();
        self.highlighted = None;
        std::mem::take(&mut self.objects)
    }

    pub fn last(&self) -> Option<&PlacedObject> {
        self.objects.last()
    }

    pub fn get(&self, id: ObjectId) -> Option<&PlacedObject> {
        self.index_of(id).map(|i| &self.objects[i])
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut PlacedObject> {
        let index = self.index_of(id)?;
        Some(&mut self.objects[index])
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.index_of(id).is_some()
    }

    /// Resolve a hit node (root or any part) to the object that owns it
    pub fn find_parent_owning(&self, node: NodeId) -> Option<ObjectId> {
        self.node_index.get(&node).copied()
    }

    /// Move the highlight to `target`, clearing the previous one
    ///
    /// `None` clears the highlight. Unknown ids clear it as well. Returns the
    /// previously highlighted object.
    pub fn set_highlighted(&mut self, target: Option<ObjectId>) -> Option<ObjectId> {
        let previous = self.highlighted.take();
        if let Some(prev) = previous.and_then(|id| self.get_mut(id)) {
            prev.highlighted = false;
        }

        if let Some(id) = target {
            if let Some(object) = self.get_mut(id) {
                object.highlighted = true;
                self.highlighted = Some(id);
            }
        }
        previous
    }

    pub fn highlighted(&self) -> Option<&PlacedObject> {
        self.highlighted.and_then(|id| self.get(id))
    }

    pub fn highlighted_id(&self) -> Option<ObjectId> {
        self.highlighted
    }

    /// Placed objects in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &PlacedObject> {
        self.objects.iter()
    }

    pub fn as_slice(&self) -> &[PlacedObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id == id)
    }

    fn unindex(&mut self, object: &PlacedObject) {
        for node in object.nodes() {
            self.node_index.remove(&node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::translation_of;

    fn setup() -> (ObjectStore, NodeIdAllocator, Template) {
        (
            ObjectStore::new(),
            NodeIdAllocator::new(),
            Template::new("lamp").with_parts(["base", "shade"]),
        )
    }

    #[test]
    fn test_append_then_undo_to_empty() {
        for n in 0..8 {
            let (mut store, mut ids, template) = setup();
            for i in 0..n {
                store.append(translation_of(i as f32, 0.0, 0.0), &template, &mut ids);
            }
            assert_eq!(store.len(), n);

            // Strict LIFO
            for i in (0..n).rev() {
                let removed = store.remove_last().unwrap();
                assert_eq!(removed.pose, translation_of(i as f32, 0.0, 0.0));
            }
            assert!(store.is_empty());
            assert!(store.remove_last().is_none());
        }
    }

    #[test]
    fn test_append_becomes_last() {
        let (mut store, mut ids, template) = setup();
        let first = store.append(Mat4::IDENTITY, &template, &mut ids).id;
        let second = store.append(Mat4::IDENTITY, &template, &mut ids).id;
        assert_ne!(first, second);
        assert_eq!(store.last().unwrap().id, second);
        assert!(store.contains(first));
    }

    #[test]
    fn test_find_parent_owning_parts() {
        let (mut store, mut ids, template) = setup();
        let object = store.append(Mat4::IDENTITY, &template, &mut ids).clone();
        assert_eq!(object.parts.len(), 2);

        assert_eq!(store.find_parent_owning(object.root_node), Some(object.id));
        for part in &object.parts {
            assert_eq!(store.find_parent_owning(*part), Some(object.id));
        }
        assert_eq!(store.find_parent_owning(NodeId(9_999)), None);

        store.remove_last();
        assert_eq!(store.find_parent_owning(object.parts[0]), None);
    }

    #[test]
    fn test_single_highlight() {
        let (mut store, mut ids, template) = setup();
        let a = store.append(Mat4::IDENTITY, &template, &mut ids).id;
        let b = store.append(Mat4::IDENTITY, &template, &mut ids).id;

        assert_eq!(store.set_highlighted(Some(a)), None);
        assert_eq!(store.set_highlighted(Some(b)), Some(a));
        assert!(!store.get(a).unwrap().highlighted);
        assert!(store.get(b).unwrap().highlighted);
        assert_eq!(store.iter().filter(|o| o.highlighted).count(), 1);

        store.set_highlighted(None);
        assert!(store.highlighted().is_none());
        assert!(store.iter().all(|o| !o.highlighted));
    }

    #[test]
    fn test_remove_last_clears_highlight() {
        let (mut store, mut ids, template) = setup();
        let a = store.append(Mat4::IDENTITY, &template, &mut ids).id;
        store.set_highlighted(Some(a));

        let removed = store.remove_last().unwrap();
        assert!(!removed.highlighted);
        assert!(store.highlighted_id().is_none());
    }

    #[test]
    fn test_clear() {
        let (mut store, mut ids, template) = setup();
        for _ in 0..3 {
            store.append(Mat4::IDENTITY, &template, &mut ids);
        }
        let root = store.last().unwrap().root_node;
        let removed = store.clear();
        assert_eq!(removed.len(), 3);
        assert!(store.is_empty());
        assert_eq!(store.find_parent_owning(root), None);
    }

    #[test]
    fn test_snapshot_json() {
        let (mut store, mut ids, template) = setup();
        store.append(translation_of(1.0, 2.0, 3.0), &template, &mut ids);

        let json = serde_json::to_value(store.as_slice()).unwrap();
        assert_eq!(json[0]["template"], "lamp");
        assert_eq!(json[0]["parts"].as_array().unwrap().len(), 2);

        let restored: Vec<PlacedObject> = serde_json::from_value(json).unwrap();
        assert_eq!(restored.as_slice(), store.as_slice());
    }
}
