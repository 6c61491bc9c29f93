//! Arena-backed host tree.
//!
//! A [`Tree`] owns every node it ever created. Nodes are addressed by
//! [`NodeRef`] handles, which are arena indices and are never reused, so a
//! handle is a stable *reference* identity: two structurally identical nodes
//! always have distinct handles. Detached nodes stay in the arena and can be
//! reinserted later.
//!
//! The mutation methods follow the DOM: moving a node detaches it from its
//! current parent first, and every mutation inside an observed subtree queues
//! a [`MutationRecord`] (see [`Tree::observe`]).
//!
//! Siblings are doubly linked next to each parent's child list, so sibling
//! navigation is O(1) however long the list grows.

use std::fmt;

use crate::error::TreeError;
use crate::mutation::{MutationLog, MutationRecord};
use crate::wire::NodeType;

/// Handle to a node inside a [`Tree`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(u32);

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeRef({})", self.0)
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single element attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// The closed set of node kinds a tree can hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document node. Only ever the root of a tree.
    Document,
    /// An element with a tag name and insertion-ordered attributes.
    Element {
        tag_name: String,
        attributes: Vec<Attribute>,
    },
    /// Character data.
    Text(String),
    /// A comment.
    Comment(String),
    /// A document type declaration.
    DocumentType {
        name: String,
        public_id: String,
        system_id: String,
    },
}

impl NodeKind {
    /// The wire node type for this kind.
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Document => NodeType::Document,
            NodeKind::Element { .. } => NodeType::Element,
            NodeKind::Text(_) => NodeType::Text,
            NodeKind::Comment(_) => NodeType::Comment,
            NodeKind::DocumentType { .. } => NodeType::DocumentType,
        }
    }

    /// Whether nodes of this kind may have children.
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Document | NodeKind::Element { .. })
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeRef>,
    children: Vec<NodeRef>,
    previous_sibling: Option<NodeRef>,
    next_sibling: Option<NodeRef>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
        }
    }
}

/// An owned, mutable tree of nodes rooted at a document node.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<NodeData>,
    root: NodeRef,
    observer: Option<MutationLog>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree holding only a document root.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData::new(NodeKind::Document)],
            root: NodeRef(0),
            observer: None,
        }
    }

    /// The document root.
    pub fn root(&self) -> NodeRef {
        self.root
    }

    /// Number of nodes ever created in this tree, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `node` belongs to this tree's arena.
    pub fn contains(&self, node: NodeRef) -> bool {
        (node.0 as usize) < self.nodes.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Construction
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a detached element.
    ///
    /// Fails with [`TreeError::InvalidCharacter`] if `tag_name` is not a
    /// valid name.
    pub fn create_element(&mut self, tag_name: &str) -> Result<NodeRef, TreeError> {
        if !is_valid_name(tag_name) {
            return Err(TreeError::InvalidCharacter(tag_name.to_string()));
        }
        Ok(self.alloc(NodeKind::Element {
            tag_name: tag_name.to_string(),
            attributes: Vec::new(),
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, data: &str) -> NodeRef {
        self.alloc(NodeKind::Text(data.to_string()))
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, data: &str) -> NodeRef {
        self.alloc(NodeKind::Comment(data.to_string()))
    }

    /// Create a detached document type node.
    pub fn create_doctype(&mut self, name: &str, public_id: &str, system_id: &str) -> NodeRef {
        self.alloc(NodeKind::DocumentType {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        })
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeRef {
        let node = NodeRef(self.nodes.len() as u32);
        self.nodes.push(NodeData::new(kind));
        node
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────────────────────

    /// The kind of `node`, if it exists.
    pub fn kind(&self, node: NodeRef) -> Option<&NodeKind> {
        self.nodes.get(node.0 as usize).map(|d| &d.kind)
    }

    /// The wire node type of `node`, if it exists.
    pub fn node_type(&self, node: NodeRef) -> Option<NodeType> {
        self.kind(node).map(NodeKind::node_type)
    }

    /// The tag name of an element.
    pub fn tag_name(&self, node: NodeRef) -> Option<&str> {
        match self.kind(node)? {
            NodeKind::Element { tag_name, .. } => Some(tag_name),
            _ => None,
        }
    }

    pub fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self.nodes.get(node.0 as usize).and_then(|d| d.parent)
    }

    /// Children of `node` in document order. Empty for unknown nodes.
    pub fn children(&self, node: NodeRef) -> &[NodeRef] {
        self.nodes
            .get(node.0 as usize)
            .map(|d| d.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn first_child(&self, node: NodeRef) -> Option<NodeRef> {
        self.children(node).first().copied()
    }

    pub fn previous_sibling(&self, node: NodeRef) -> Option<NodeRef> {
        self.nodes.get(node.0 as usize).and_then(|d| d.previous_sibling)
    }

    pub fn next_sibling(&self, node: NodeRef) -> Option<NodeRef> {
        self.nodes.get(node.0 as usize).and_then(|d| d.next_sibling)
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeRef, node: NodeRef) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Whether `node` is reachable from the root.
    pub fn is_connected(&self, node: NodeRef) -> bool {
        self.is_inclusive_ancestor(self.root, node)
    }

    /// Attributes of an element, in insertion order.
    pub fn attributes(&self, node: NodeRef) -> &[Attribute] {
        match self.kind(node) {
            Some(NodeKind::Element { attributes, .. }) => attributes,
            _ => &[],
        }
    }

    /// Current value of an attribute.
    pub fn attribute(&self, node: NodeRef, name: &str) -> Option<&str> {
        self.attributes(node)
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Text content in DOM terms: character data for text and comment nodes,
    /// concatenated descendant text for elements, `None` otherwise.
    pub fn text_content(&self, node: NodeRef) -> Option<String> {
        match self.kind(node)? {
            NodeKind::Text(data) | NodeKind::Comment(data) => Some(data.clone()),
            NodeKind::Element { .. } => {
                let mut out = String::new();
                self.collect_text(node, &mut out);
                Some(out)
            }
            NodeKind::Document | NodeKind::DocumentType { .. } => None,
        }
    }

    fn collect_text(&self, node: NodeRef, out: &mut String) {
        for child in self.children(node) {
            match self.kind(*child) {
                Some(NodeKind::Text(data)) => out.push_str(data),
                Some(NodeKind::Element { .. }) => self.collect_text(*child, out),
                _ => {}
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Child list mutation
    // ─────────────────────────────────────────────────────────────────────────

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeRef, child: NodeRef) -> Result<(), TreeError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` into `parent` before `reference`, or at the end when
    /// `reference` is `None`. A node that already has a parent is moved.
    pub fn insert_before(
        &mut self,
        parent: NodeRef,
        child: NodeRef,
        reference: Option<NodeRef>,
    ) -> Result<(), TreeError> {
        let parent_kind = self.data(parent)?.kind.clone();
        let child_kind = &self.data(child)?.kind;

        if !parent_kind.is_container() || matches!(child_kind, NodeKind::Document) {
            return Err(TreeError::HierarchyRequest {
                parent,
                child,
                reason: "parent cannot hold this child",
            });
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(TreeError::HierarchyRequest {
                parent,
                child,
                reason: "child is an inclusive ancestor of parent",
            });
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(TreeError::NotFound {
                    parent,
                    node: reference,
                });
            }
        }

        // Inserting a node before itself means inserting before its next sibling.
        let reference = match reference {
            Some(r) if r == child => self.next_sibling(child),
            other => other,
        };

        if let Some(old_parent) = self.parent(child) {
            self.remove_child(old_parent, child)?;
        }

        let index = match reference {
            Some(r) => self
                .children(parent)
                .iter()
                .position(|c| *c == r)
                .ok_or(TreeError::NotFound { parent, node: r })?,
            None => self.children(parent).len(),
        };

        let previous_sibling = index.checked_sub(1).map(|i| self.children(parent)[i]);
        let next_sibling = reference;
        self.data_mut(parent)?.children.insert(index, child);
        self.data_mut(child)?.parent = Some(parent);
        self.link(child, previous_sibling, next_sibling)?;

        self.record(MutationRecord::ChildList {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
            previous_sibling,
            next_sibling,
        });
        Ok(())
    }

    /// Remove `child` from `parent`.
    pub fn remove_child(&mut self, parent: NodeRef, child: NodeRef) -> Result<(), TreeError> {
        if self.parent(child) != Some(parent) {
            return Err(TreeError::NotFound {
                parent,
                node: child,
            });
        }
        let previous_sibling = self.previous_sibling(child);
        let next_sibling = self.next_sibling(child);

        self.data_mut(parent)?.children.retain(|c| *c != child);
        self.data_mut(child)?.parent = None;
        self.unlink(child)?;

        let recorded = self.record(MutationRecord::ChildList {
            target: parent,
            added: Vec::new(),
            removed: vec![child],
            previous_sibling,
            next_sibling,
        });
        if recorded {
            self.keep_observing(child);
        }
        Ok(())
    }

    /// Detach `node` from its parent. Does nothing for parentless nodes.
    pub fn detach(&mut self, node: NodeRef) -> Result<(), TreeError> {
        match self.parent(node) {
            Some(parent) => self.remove_child(parent, node),
            None => {
                self.data(node)?;
                Ok(())
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Attribute and character data mutation
    // ─────────────────────────────────────────────────────────────────────────

    /// Set an attribute on an element, replacing any previous value.
    pub fn set_attribute(&mut self, node: NodeRef, name: &str, value: &str) -> Result<(), TreeError> {
        if !is_valid_name(name) {
            return Err(TreeError::InvalidCharacter(name.to_string()));
        }
        let attributes = self.attributes_mut(node)?;
        let old_value = match attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => Some(std::mem::replace(&mut attr.value, value.to_string())),
            None => {
                attributes.push(Attribute {
                    name: name.to_string(),
                    value: value.to_string(),
                });
                None
            }
        };
        self.record(MutationRecord::Attributes {
            target: node,
            name: name.to_string(),
            old_value,
        });
        Ok(())
    }

    /// Remove an attribute from an element. Removing an absent attribute is a
    /// no-op and queues no record.
    pub fn remove_attribute(&mut self, node: NodeRef, name: &str) -> Result<(), TreeError> {
        let attributes = self.attributes_mut(node)?;
        let Some(index) = attributes.iter().position(|a| a.name == name) else {
            return Ok(());
        };
        let removed = attributes.remove(index);
        self.record(MutationRecord::Attributes {
            target: node,
            name: name.to_string(),
            old_value: Some(removed.value),
        });
        Ok(())
    }

    fn attributes_mut(&mut self, node: NodeRef) -> Result<&mut Vec<Attribute>, TreeError> {
        match &mut self.data_mut(node)?.kind {
            NodeKind::Element { attributes, .. } => Ok(attributes),
            _ => Err(TreeError::NotAnElement(node)),
        }
    }

    /// Replace the data of a text or comment node.
    pub fn set_character_data(&mut self, node: NodeRef, data: &str) -> Result<(), TreeError> {
        let old_value = match &mut self.data_mut(node)?.kind {
            NodeKind::Text(current) | NodeKind::Comment(current) => {
                std::mem::replace(current, data.to_string())
            }
            _ => return Err(TreeError::NotCharacterData(node)),
        };
        self.record(MutationRecord::CharacterData {
            target: node,
            old_value,
        });
        Ok(())
    }

    /// Set text content in DOM terms: character data nodes get their data
    /// replaced, containers lose all children and gain a single text node
    /// (none when `text` is empty), document types are left alone.
    pub fn set_text_content(&mut self, node: NodeRef, text: &str) -> Result<(), TreeError> {
        match self.data(node)?.kind.node_type() {
            NodeType::Text | NodeType::Comment => self.set_character_data(node, text),
            NodeType::Element | NodeType::Document => {
                let old_children = std::mem::take(&mut self.data_mut(node)?.children);
                for child in &old_children {
                    let data = self.data_mut(*child)?;
                    data.parent = None;
                    data.previous_sibling = None;
                    data.next_sibling = None;
                }
                let mut added = Vec::new();
                if !text.is_empty() {
                    let text_node = self.create_text(text);
                    self.data_mut(node)?.children.push(text_node);
                    self.data_mut(text_node)?.parent = Some(node);
                    added.push(text_node);
                }
                if !old_children.is_empty() || !added.is_empty() {
                    let recorded = self.record(MutationRecord::ChildList {
                        target: node,
                        added,
                        removed: old_children.clone(),
                        previous_sibling: None,
                        next_sibling: None,
                    });
                    if recorded {
                        for child in old_children {
                            self.keep_observing(child);
                        }
                    }
                }
                Ok(())
            }
            NodeType::DocumentType => Ok(()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Observation
    // ─────────────────────────────────────────────────────────────────────────

    /// Start queueing mutation records for the subtree rooted at `target`.
    ///
    /// Replaces any previous observation and drops its pending records.
    ///
    /// A node removed from the observed subtree stays observed until the
    /// next [`take_records`](Self::take_records), so changes made to it while
    /// it is detached land in the same batch as its removal.
    pub fn observe(&mut self, target: NodeRef) -> Result<(), TreeError> {
        self.data(target)?;
        self.observer = Some(MutationLog::new(target));
        Ok(())
    }

    /// The node currently observed, if any.
    pub fn observed(&self) -> Option<NodeRef> {
        self.observer.as_ref().map(|log| log.target)
    }

    /// Drain the pending batch of mutation records.
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        self.observer
            .as_mut()
            .map(MutationLog::take)
            .unwrap_or_default()
    }

    /// Stop observing. Pending records are dropped.
    pub fn disconnect_observer(&mut self) {
        self.observer = None;
    }

    /// Queue `record` if its target is observed. Returns whether it was.
    fn record(&mut self, record: MutationRecord) -> bool {
        let Some(log) = self.observer.as_ref() else {
            return false;
        };
        let observed = std::iter::successors(Some(record.target()), |node| self.parent(*node))
            .any(|node| log.is_root(node));
        if !observed {
            return false;
        }
        if let Some(log) = self.observer.as_mut() {
            log.push(record);
        }
        true
    }

    fn keep_observing(&mut self, node: NodeRef) {
        if let Some(log) = self.observer.as_mut() {
            log.add_transient(node);
        }
    }

    fn link(
        &mut self,
        node: NodeRef,
        previous: Option<NodeRef>,
        next: Option<NodeRef>,
    ) -> Result<(), TreeError> {
        if let Some(previous) = previous {
            self.data_mut(previous)?.next_sibling = Some(node);
        }
        if let Some(next) = next {
            self.data_mut(next)?.previous_sibling = Some(node);
        }
        let data = self.data_mut(node)?;
        data.previous_sibling = previous;
        data.next_sibling = next;
        Ok(())
    }

    fn unlink(&mut self, node: NodeRef) -> Result<(), TreeError> {
        let data = self.data_mut(node)?;
        let previous = data.previous_sibling.take();
        let next = data.next_sibling.take();
        if let Some(previous) = previous {
            self.data_mut(previous)?.next_sibling = next;
        }
        if let Some(next) = next {
            self.data_mut(next)?.previous_sibling = previous;
        }
        Ok(())
    }

    fn data(&self, node: NodeRef) -> Result<&NodeData, TreeError> {
        self.nodes
            .get(node.0 as usize)
            .ok_or(TreeError::UnknownNode(node))
    }

    fn data_mut(&mut self, node: NodeRef) -> Result<&mut NodeData, TreeError> {
        self.nodes
            .get_mut(node.0 as usize)
            .ok_or(TreeError::UnknownNode(node))
    }
}

/// Whether `name` is acceptable as a tag or attribute name.
///
/// Rejects empty names, names starting with a digit, `-` or `.`, and names
/// containing whitespace, control characters, quotes, `<`, `>`, `/` or `=`.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if first.is_ascii_digit() || first == '-' || first == '.' {
        return false;
    }
    name.chars().all(|c| {
        !c.is_whitespace() && !c.is_control() && !matches!(c, '"' | '\'' | '<' | '>' | '/' | '=')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::MutationKind;

    fn element(tree: &mut Tree, tag: &str) -> NodeRef {
        tree.create_element(tag).unwrap()
    }

    #[test]
    fn test_append_and_navigate() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = element(&mut tree, "a");
        let b = element(&mut tree, "b");
        let c = element(&mut tree, "c");
        tree.append_child(root, a).unwrap();
        tree.append_child(root, b).unwrap();
        tree.append_child(root, c).unwrap();

        assert_eq!(tree.children(root), &[a, b, c]);
        assert_eq!(tree.previous_sibling(b), Some(a));
        assert_eq!(tree.next_sibling(b), Some(c));
        assert_eq!(tree.previous_sibling(a), None);
        assert_eq!(tree.first_child(root), Some(a));
        assert!(tree.is_connected(c));
    }

    #[test]
    fn test_insert_before_moves_node() {
        let mut tree = Tree::new();
        let root = tree.root();
        let p = element(&mut tree, "p");
        let q = element(&mut tree, "q");
        let x = tree.create_text("x");
        tree.append_child(root, p).unwrap();
        tree.append_child(root, q).unwrap();
        tree.append_child(p, x).unwrap();

        tree.insert_before(q, x, None).unwrap();
        assert!(tree.children(p).is_empty());
        assert_eq!(tree.children(q), &[x]);
        assert_eq!(tree.parent(x), Some(q));
    }

    #[test]
    fn test_insert_into_descendant_rejected() {
        let mut tree = Tree::new();
        let root = tree.root();
        let outer = element(&mut tree, "div");
        let inner = element(&mut tree, "span");
        tree.append_child(root, outer).unwrap();
        tree.append_child(outer, inner).unwrap();

        let err = tree.append_child(inner, outer).unwrap_err();
        assert!(matches!(err, TreeError::HierarchyRequest { .. }));
        assert_eq!(tree.parent(outer), Some(root));
    }

    #[test]
    fn test_insert_under_text_rejected() {
        let mut tree = Tree::new();
        let text = tree.create_text("leaf");
        let div = element(&mut tree, "div");
        assert!(tree.append_child(text, div).is_err());
    }

    #[test]
    fn test_invalid_attribute_name() {
        let mut tree = Tree::new();
        let div = element(&mut tree, "div");
        let err = tree.set_attribute(div, "\"", "x").unwrap_err();
        assert!(matches!(err, TreeError::InvalidCharacter(_)));
        assert!(tree.attributes(div).is_empty());
    }

    #[test]
    fn test_set_attribute_replaces_in_place() {
        let mut tree = Tree::new();
        let div = element(&mut tree, "div");
        tree.set_attribute(div, "id", "a").unwrap();
        tree.set_attribute(div, "class", "b").unwrap();
        tree.set_attribute(div, "id", "c").unwrap();
        let names: Vec<_> = tree.attributes(div).iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["id", "class"]);
        assert_eq!(tree.attribute(div, "id"), Some("c"));
    }

    #[test]
    fn test_set_text_content_replaces_children() {
        let mut tree = Tree::new();
        let div = element(&mut tree, "div");
        let span = element(&mut tree, "span");
        tree.append_child(div, span).unwrap();
        tree.set_text_content(div, "hello").unwrap();
        assert_eq!(tree.children(div).len(), 1);
        assert_eq!(tree.text_content(div).as_deref(), Some("hello"));
        assert_eq!(tree.parent(span), None);
    }

    #[test]
    fn test_records_only_inside_observed_subtree() {
        let mut tree = Tree::new();
        let root = tree.root();
        let inside = element(&mut tree, "div");
        tree.append_child(root, inside).unwrap();
        let outside = element(&mut tree, "div");

        tree.observe(root).unwrap();
        tree.set_attribute(inside, "id", "x").unwrap();
        tree.set_attribute(outside, "id", "y").unwrap();

        let records = tree.take_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].target(), inside);
        assert!(tree.take_records().is_empty());
    }

    #[test]
    fn test_move_records_removal_then_addition() {
        let mut tree = Tree::new();
        let root = tree.root();
        let p = element(&mut tree, "p");
        let q = element(&mut tree, "q");
        let x = element(&mut tree, "x");
        tree.append_child(root, p).unwrap();
        tree.append_child(root, q).unwrap();
        tree.append_child(p, x).unwrap();

        tree.observe(root).unwrap();
        tree.append_child(q, x).unwrap();
        let records = tree.take_records();
        assert_eq!(records.len(), 2);
        assert!(matches!(&records[0], MutationRecord::ChildList { target, removed, .. } if *target == p && removed == &vec![x]));
        assert!(matches!(&records[1], MutationRecord::ChildList { target, added, .. } if *target == q && added == &vec![x]));
    }

    #[test]
    fn test_removed_node_stays_observed_until_taken() {
        let mut tree = Tree::new();
        let root = tree.root();
        let div = element(&mut tree, "div");
        let span = element(&mut tree, "span");
        tree.append_child(root, div).unwrap();
        tree.append_child(div, span).unwrap();

        tree.observe(root).unwrap();
        tree.remove_child(root, div).unwrap();
        tree.set_attribute(span, "class", "detached").unwrap();
        tree.append_child(root, div).unwrap();

        let kinds: Vec<_> = tree.take_records().iter().map(MutationRecord::kind).collect();
        assert_eq!(
            kinds,
            vec![
                MutationKind::ChildList,
                MutationKind::Attributes,
                MutationKind::ChildList,
            ]
        );

        // Once the batch is taken, a detached node is no longer watched.
        tree.remove_child(root, div).unwrap();
        tree.take_records();
        tree.set_attribute(span, "class", "later").unwrap();
        assert!(tree.take_records().is_empty());
    }

    #[test]
    fn test_text_content_children_stay_observed() {
        let mut tree = Tree::new();
        let root = tree.root();
        let div = element(&mut tree, "div");
        let old = tree.create_text("old");
        tree.append_child(root, div).unwrap();
        tree.append_child(div, old).unwrap();

        tree.observe(root).unwrap();
        tree.set_text_content(div, "new").unwrap();
        tree.set_character_data(old, "edited").unwrap();

        let records = tree.take_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].kind(), MutationKind::CharacterData);
        assert_eq!(records[1].target(), old);
    }

    #[test]
    fn test_sibling_links_follow_moves() {
        let mut tree = Tree::new();
        let root = tree.root();
        let nodes: Vec<_> = ["a", "b", "c", "d"]
            .iter()
            .map(|t| element(&mut tree, t))
            .collect();
        for node in &nodes {
            tree.append_child(root, *node).unwrap();
        }
        let (a, b, c, d) = (nodes[0], nodes[1], nodes[2], nodes[3]);

        tree.insert_before(root, d, Some(b)).unwrap();
        assert_eq!(tree.children(root), &[a, d, b, c]);
        assert_eq!(tree.next_sibling(a), Some(d));
        assert_eq!(tree.previous_sibling(b), Some(d));
        assert_eq!(tree.next_sibling(c), None);

        tree.remove_child(root, a).unwrap();
        assert_eq!(tree.previous_sibling(d), None);
        assert_eq!(tree.previous_sibling(a), None);
        assert_eq!(tree.next_sibling(a), None);

        tree.set_text_content(root, "").unwrap();
        assert_eq!(tree.next_sibling(d), None);
        assert_eq!(tree.previous_sibling(c), None);
    }

    fn assert_links_match_children(tree: &Tree) {
        for index in 0..tree.len() {
            let parent = NodeRef(index as u32);
            let children = tree.children(parent);
            for (i, child) in children.iter().enumerate() {
                let previous = i.checked_sub(1).map(|p| children[p]);
                assert_eq!(tree.previous_sibling(*child), previous);
                assert_eq!(tree.next_sibling(*child), children.get(i + 1).copied());
            }
            if tree.parent(parent).is_none() {
                assert_eq!(tree.previous_sibling(parent), None);
                assert_eq!(tree.next_sibling(parent), None);
            }
        }
    }

    proptest::proptest! {
        #[test]
        fn test_sibling_links_survive_any_edit_sequence(
            ops in proptest::collection::vec((0u8..4, 0usize..7, 0usize..7), 0..40)
        ) {
            let mut tree = Tree::new();
            let root = tree.root();
            let mut nodes = vec![root];
            for tag in ["a", "b", "c", "d", "e", "f"] {
                let node = element(&mut tree, tag);
                tree.append_child(root, node).unwrap();
                nodes.push(node);
            }

            for (op, x, y) in ops {
                let (x, y) = (nodes[x], nodes[y]);
                // Rejected edits must leave the links untouched too.
                let _ = match op {
                    0 => tree.append_child(x, y),
                    1 => tree.insert_before(x, y, tree.first_child(x)),
                    2 => tree.detach(y),
                    _ => tree.set_text_content(x, "t"),
                };
                assert_links_match_children(&tree);
            }
        }
    }

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("div"));
        assert!(is_valid_name("data-x"));
        assert!(is_valid_name("xlink:href"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("1abc"));
        assert!(!is_valid_name("a b"));
        assert!(!is_valid_name("<div"));
    }
}
