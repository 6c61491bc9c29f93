//! Error types for the capture side.

use thiserror::Error;
use treemirror_core::{NodeRef, TreeError};

/// Errors that can occur while connecting a capture client.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The host tree rejected the operation.
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    /// The tree already has an observer attached.
    #[error("tree is already observed at {0}")]
    AlreadyObserved(NodeRef),

    /// Only documents and elements can be observed.
    #[error("node {0} cannot be observed: it has no children")]
    NotAContainer(NodeRef),
}

/// Result type for capture operations.
pub type Result<T> = std::result::Result<T, CaptureError>;
