//! Error types for the mirror side.

use thiserror::Error;
use treemirror_core::{NodeId, TreeError};

/// Errors that can occur while applying messages to a mirror.
///
/// Every variant except [`MirrorError::AlreadyInitialized`] is contained to
/// the record that raised it; the rest of the batch still applies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MirrorError {
    /// A second initialize message arrived.
    #[error("mirror is already initialized")]
    AlreadyInitialized,

    /// A back-reference named an id the mirror does not hold.
    #[error("unknown node id {0}")]
    UnknownId(NodeId),

    /// A first-seen record has no node type.
    #[error("record {0} has no node type")]
    MissingNodeType(NodeId),

    /// A first-seen element record has no tag name.
    #[error("element record {0} has no tag name")]
    MissingTagName(NodeId),

    /// An added-or-moved record has no parent anchor.
    #[error("placement record {0} has no parent")]
    MissingParent(NodeId),

    /// Document records cannot be constructed inside a mirror.
    #[error("record {0} is a document")]
    UnexpectedDocument(NodeId),

    /// The mirror tree rejected an operation.
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),
}

/// Result type for mirror operations.
pub type Result<T> = std::result::Result<T, MirrorError>;
