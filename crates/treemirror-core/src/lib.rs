//! # Tree Mirror Core
//!
//! Pure primitives shared by the capture and mirror sides.
//!
//! This crate contains no I/O and no session state. It defines the host tree
//! the capture side observes, the raw mutation records that tree queues, and
//! the wire format both sides agree on.
//!
//! ## Key Types
//!
//! - [`Tree`] - Arena-backed document tree with DOM-like mutation methods
//! - [`NodeRef`] - Stable handle to a node inside a [`Tree`]
//! - [`MutationRecord`] - One raw change notification from an observed tree
//! - [`SerializedNode`] - Transmissible node record (or back-reference)
//! - [`InitializeMessage`] / [`ChangeMessage`] - The two wire messages
//! - [`MirrorSink`] - Anything that consumes those messages
//!
//! ## Wire Format
//!
//! Messages are JSON-compatible. See the [`wire`] module.

pub mod error;
pub mod mutation;
pub mod sink;
pub mod text;
pub mod tree;
pub mod wire;

pub use error::{TreeError, WireError};
pub use mutation::{MutationKind, MutationRecord};
pub use sink::MirrorSink;
pub use text::decode_escapes;
pub use tree::{is_valid_name, Attribute, NodeKind, NodeRef, Tree};
pub use wire::{
    AttributeMap, ChangeMessage, InitializeMessage, MirrorMessage, NodeId, NodeType,
    SerializedNode,
};
