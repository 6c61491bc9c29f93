//! Wire records and messages.
//!
//! Everything here serializes to JSON-compatible structures with camelCase
//! keys; absent fields are omitted rather than written as `null`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::WireError;

/// Session-scoped node identifier. Positive, assigned from 1.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Node type discriminator, encoded with the DOM's numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
#[repr(u16)]
pub enum NodeType {
    Element = 1,
    Text = 3,
    Comment = 8,
    Document = 9,
    DocumentType = 10,
}

impl TryFrom<u16> for NodeType {
    type Error = WireError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(NodeType::Element),
            3 => Ok(NodeType::Text),
            8 => Ok(NodeType::Comment),
            9 => Ok(NodeType::Document),
            10 => Ok(NodeType::DocumentType),
            other => Err(WireError::UnknownNodeType(other)),
        }
    }
}

impl From<NodeType> for u16 {
    fn from(node_type: NodeType) -> Self {
        node_type as u16
    }
}

/// Attribute map carried by a record. `None` values only appear in
/// attribute-change records and mean "removed".
pub type AttributeMap = BTreeMap<String, Option<String>>;

/// A transmissible node record.
///
/// A record with only `id` set is a back-reference to a node the receiver
/// already knows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedNode {
    pub id: NodeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<AttributeMap>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_nodes: Option<Vec<SerializedNode>>,

    /// Anchor for added-or-moved records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_sibling: Option<Box<SerializedNode>>,

    /// Anchor for added-or-moved records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_node: Option<Box<SerializedNode>>,
}

impl SerializedNode {
    /// A back-reference record.
    pub fn reference(id: NodeId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Whether this record carries no payload besides its id.
    pub fn is_reference(&self) -> bool {
        self.node_type.is_none()
            && self.tag_name.is_none()
            && self.attributes.is_none()
            && self.text_content.is_none()
            && self.name.is_none()
            && self.public_id.is_none()
            && self.system_id.is_none()
            && self.child_nodes.is_none()
    }

    /// The same record without the added-or-moved anchors.
    pub fn without_anchors(&self) -> Self {
        Self {
            previous_sibling: None,
            parent_node: None,
            ..self.clone()
        }
    }
}

/// The snapshot that seeds a mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeMessage {
    pub root_id: NodeId,
    pub children: Vec<SerializedNode>,
}

/// One encoded batch of changes. Empty lists are omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeMessage {
    #[serde(rename = "rem", default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<SerializedNode>,

    #[serde(rename = "adOrMo", default, skip_serializing_if = "Vec::is_empty")]
    pub added_or_moved: Vec<SerializedNode>,

    #[serde(rename = "att", default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<SerializedNode>,

    #[serde(rename = "text", default, skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<SerializedNode>,
}

impl ChangeMessage {
    /// Whether every list is empty. Empty messages are never emitted.
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
            && self.added_or_moved.is_empty()
            && self.attributes.is_empty()
            && self.text.is_empty()
    }

    /// Total number of records across all lists.
    pub fn record_count(&self) -> usize {
        self.removed.len() + self.added_or_moved.len() + self.attributes.len() + self.text.len()
    }
}

/// Either message a mirror can receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorMessage {
    Initialize(InitializeMessage),
    Change(ChangeMessage),
}

impl MirrorMessage {
    /// Encode the inner message as JSON.
    pub fn to_json(&self) -> Result<String, WireError> {
        let json = match self {
            MirrorMessage::Initialize(msg) => serde_json::to_string(msg)?,
            MirrorMessage::Change(msg) => serde_json::to_string(msg)?,
        };
        Ok(json)
    }
}
