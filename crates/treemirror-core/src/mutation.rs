//! Raw mutation notifications queued by an observed [`Tree`](crate::Tree).

use std::collections::HashSet;

use crate::tree::NodeRef;

/// The kind of change a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    ChildList,
    Attributes,
    CharacterData,
}

/// One low-level change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    /// Children were inserted into or removed from `target`.
    ChildList {
        target: NodeRef,
        added: Vec<NodeRef>,
        removed: Vec<NodeRef>,
        previous_sibling: Option<NodeRef>,
        next_sibling: Option<NodeRef>,
    },
    /// An attribute of `target` was set or removed.
    Attributes {
        target: NodeRef,
        name: String,
        old_value: Option<String>,
    },
    /// The data of a text or comment node changed.
    CharacterData { target: NodeRef, old_value: String },
}

impl MutationRecord {
    /// The node the change happened on.
    pub fn target(&self) -> NodeRef {
        match self {
            MutationRecord::ChildList { target, .. }
            | MutationRecord::Attributes { target, .. }
            | MutationRecord::CharacterData { target, .. } => *target,
        }
    }

    pub fn kind(&self) -> MutationKind {
        match self {
            MutationRecord::ChildList { .. } => MutationKind::ChildList,
            MutationRecord::Attributes { .. } => MutationKind::Attributes,
            MutationRecord::CharacterData { .. } => MutationKind::CharacterData,
        }
    }
}

/// Pending records for one observed subtree.
///
/// Nodes removed from the subtree are kept as transient roots until the
/// batch is taken.
#[derive(Debug)]
pub(crate) struct MutationLog {
    pub(crate) target: NodeRef,
    transient: HashSet<NodeRef>,
    records: Vec<MutationRecord>,
}

impl MutationLog {
    pub(crate) fn new(target: NodeRef) -> Self {
        Self {
            target,
            transient: HashSet::new(),
            records: Vec::new(),
        }
    }

    /// Whether `node` is the observed node or a transient root.
    pub(crate) fn is_root(&self, node: NodeRef) -> bool {
        node == self.target || self.transient.contains(&node)
    }

    pub(crate) fn add_transient(&mut self, node: NodeRef) {
        self.transient.insert(node);
    }

    pub(crate) fn push(&mut self, record: MutationRecord) {
        self.records.push(record);
    }

    pub(crate) fn take(&mut self) -> Vec<MutationRecord> {
        self.transient.clear();
        std::mem::take(&mut self.records)
    }
}
