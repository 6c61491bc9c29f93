//! Tree serializer: turns host nodes into wire records.
//!
//! The first time a node is serialized it gets an id and a full record; every
//! later serialization of the same node is a `{id}` back-reference, which
//! keeps re-sending an unchanged subtree O(1).

use serde::{Deserialize, Serialize};
use treemirror_core::{
    decode_escapes, AttributeMap, InitializeMessage, NodeId, NodeKind, NodeRef, SerializedNode,
    Tree,
};

use crate::registry::IdentityRegistry;

/// Configuration for the capture side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptureConfig {
    /// Decode percent escapes in text and comment content before sending.
    pub decode_text_escapes: bool,
}

/// Serializer bound to one observed root and one identity registry.
#[derive(Debug)]
pub struct TreeSerializer {
    root: NodeRef,
    registry: IdentityRegistry,
    config: CaptureConfig,
}

impl TreeSerializer {
    pub fn new(root: NodeRef, config: CaptureConfig) -> Self {
        Self {
            root,
            registry: IdentityRegistry::new(),
            config,
        }
    }

    /// The observed root.
    pub fn root(&self) -> NodeRef {
        self.root
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Serialize `node`.
    ///
    /// Returns `None` for `None`, and for an unknown node that is not under
    /// the observed root. A known node yields a back-reference. Otherwise the
    /// node gets a fresh id and a full record; with `recursive` the record
    /// includes every child in document order.
    pub fn serialize_node(
        &mut self,
        tree: &Tree,
        node: Option<NodeRef>,
        recursive: bool,
    ) -> Option<SerializedNode> {
        let node = node?;
        if let Some(id) = self.registry.get(node) {
            return Some(SerializedNode::reference(id));
        }
        if !tree.is_inclusive_ancestor(self.root, node) {
            tracing::debug!(%node, "skipping node outside the observed root");
            return None;
        }
        let kind = tree.kind(node)?;

        let mut record = SerializedNode {
            id: self.registry.remember_node(node),
            node_type: Some(kind.node_type()),
            ..SerializedNode::default()
        };

        match kind {
            NodeKind::Document => {}
            NodeKind::DocumentType {
                name,
                public_id,
                system_id,
            } => {
                record.name = Some(name.clone());
                record.public_id = Some(public_id.clone());
                record.system_id = Some(system_id.clone());
            }
            NodeKind::Text(data) | NodeKind::Comment(data) => {
                record.text_content = Some(self.captured_text(data));
            }
            NodeKind::Element {
                tag_name,
                attributes,
            } => {
                record.tag_name = Some(tag_name.clone());
                record.attributes = Some(
                    attributes
                        .iter()
                        .map(|a| (a.name.clone(), Some(a.value.clone())))
                        .collect::<AttributeMap>(),
                );
                let children = tree.children(node);
                if recursive && !children.is_empty() {
                    record.child_nodes = Some(
                        children
                            .iter()
                            .filter_map(|child| self.serialize_node(tree, Some(*child), true))
                            .collect(),
                    );
                }
            }
        }

        Some(record)
    }

    /// Back-reference for a node that is already known, `None` otherwise.
    pub fn reference(&self, node: NodeRef) -> Option<SerializedNode> {
        self.registry.get(node).map(SerializedNode::reference)
    }

    /// Snapshot of the observed root: the root's id plus a full recursive
    /// record for each of its children.
    pub fn snapshot(&mut self, tree: &Tree) -> InitializeMessage {
        let root_id = self.registry.remember_node(self.root);
        let children = tree
            .children(self.root)
            .iter()
            .filter_map(|child| self.serialize_node(tree, Some(*child), true))
            .collect();
        InitializeMessage { root_id, children }
    }

    /// Release the id of a node.
    pub fn forget(&mut self, node: NodeRef) -> Option<NodeId> {
        self.registry.forget_node(node)
    }

    /// Current text content of `node` as it goes on the wire.
    pub fn text_of(&self, tree: &Tree, node: NodeRef) -> Option<String> {
        let text = tree.text_content(node)?;
        Some(self.captured_text(&text))
    }

    fn captured_text(&self, text: &str) -> String {
        if self.config.decode_text_escapes {
            decode_escapes(text)
        } else {
            text.to_string()
        }
    }
}
