//! Error types for the Tree Mirror core.

use thiserror::Error;

use crate::tree::NodeRef;

/// Errors raised by structural operations on a [`Tree`](crate::Tree).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("hierarchy request error inserting {child} into {parent}: {reason}")]
    HierarchyRequest {
        parent: NodeRef,
        child: NodeRef,
        reason: &'static str,
    },

    #[error("node {node} is not a child of {parent}")]
    NotFound { parent: NodeRef, node: NodeRef },

    #[error("invalid character in name: {0:?}")]
    InvalidCharacter(String),

    #[error("node {0} is not an element")]
    NotAnElement(NodeRef),

    #[error("node {0} does not hold character data")]
    NotCharacterData(NodeRef),

    #[error("unknown node {0}")]
    UnknownNode(NodeRef),
}

/// Errors decoding or encoding wire payloads.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("unknown node type: {0}")]
    UnknownNodeType(u16),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
