//! Node identity registry: the capture side's `NodeRef -> NodeId` side table.
//!
//! Keys are arena handles, so identity is by reference and never by content.
//! Ids are handed out sequentially from 1 and a released id is never handed
//! out again within the same registry.

use std::collections::HashMap;

use treemirror_core::{NodeId, NodeRef};

/// Per-session mapping of observed nodes to stable ids.
#[derive(Debug)]
pub struct IdentityRegistry {
    next_id: u32,
    known: HashMap<NodeRef, NodeId>,
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityRegistry {
    /// Create an empty registry whose first id is 1.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            known: HashMap::new(),
        }
    }

    /// Assign the next id to `node` and remember it.
    ///
    /// A node that is already known keeps its id.
    pub fn remember_node(&mut self, node: NodeRef) -> NodeId {
        if let Some(id) = self.known.get(&node) {
            return *id;
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.known.insert(node, id);
        id
    }

    pub fn get(&self, node: NodeRef) -> Option<NodeId> {
        self.known.get(&node).copied()
    }

    pub fn contains(&self, node: NodeRef) -> bool {
        self.known.contains_key(&node)
    }

    /// Release the id of `node`. The id itself is never reused.
    pub fn forget_node(&mut self, node: NodeRef) -> Option<NodeId> {
        self.known.remove(&node)
    }

    /// The id the next first-seen node will get.
    pub fn next_id(&self) -> NodeId {
        NodeId(self.next_id)
    }

    /// Number of nodes currently known.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}
