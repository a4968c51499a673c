//! Scene node identifiers shared with the renderer
//!
//! The core hands out every node id the renderer mirrors (placed object roots,
//! their parts, floor visuals, image covers). Hit-test results come back
//! carrying those ids.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Node name carried by surface (floor) visuals
pub const FLOOR_NODE_NAME: &str = "floor";

/// Node name carried by image cover visuals
pub const IMAGE_NODE_NAME: &str = "image";

/// Opaque scene node id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Monotonic node id source
///
/// Ids are never reused within a session, including across resets, so a
/// renderer holding a stale id cannot alias a new node.
#[derive(Debug, Clone, Default)]
pub struct NodeIdAllocator {
    next: u64,
}

impl NodeIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_is_monotonic() {
        let mut ids = NodeIdAllocator::new();
        let a = ids.allocate();
        let b = ids.allocate();
        assert_ne!(a, b);
        assert!(b > a);
        assert_eq!(a.to_string(), "node#0");
    }
}
