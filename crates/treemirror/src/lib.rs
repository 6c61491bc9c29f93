//! # Tree Mirror
//!
//! Keep a replica of a live document tree in sync from an initial snapshot
//! followed by compact batches of changes.
//!
//! ## Overview
//!
//! - **Capture**: observe a subtree, snapshot it, and encode each batch of
//!   raw mutations into a change message
//! - **Mirror**: rebuild the subtree from the snapshot and apply every change
//!   message, resolving nodes by their numeric ids
//! - **Sync**: deliver messages over an in-process channel, record and replay
//!   them, and verify that source and mirror converged
//!
//! ## Key Concepts
//!
//! - **Node id**: A positive integer assigned on first serialization. Never
//!   reused within a session.
//! - **Back-reference**: A record carrying only `id`, for a node the
//!   receiver already knows.
//! - **Run**: Contiguous changed siblings under one parent, sent left to
//!   right with their previous sibling and parent as anchors.
//!
//! ## Usage
//!
//! ```rust
//! use treemirror::{MirrorSession, SessionConfig};
//! use treemirror::core::Tree;
//!
//! let mut source = Tree::new();
//! let root = source.root();
//! let list = source.create_element("UL").unwrap();
//! source.append_child(root, list).unwrap();
//!
//! let mut session = MirrorSession::start(&mut source, root, SessionConfig::default()).unwrap();
//!
//! let item = source.create_element("LI").unwrap();
//! source.append_child(list, item).unwrap();
//! let report = session.flush(&mut source).unwrap();
//!
//! assert!(report.is_clean());
//! assert!(session.verify(&source).is_converged());
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `treemirror::core` - Tree, mutation records and wire types
//! - `treemirror::capture` - Serializer, encoder and client
//! - `treemirror::mirror` - Mirror applier and delegates
//! - `treemirror::sync` - Channel transport, recording and convergence

pub mod error;
pub mod session;

// Re-export component crates
pub use treemirror_capture as capture;
pub use treemirror_core as core;
pub use treemirror_mirror as mirror;
pub use treemirror_sync as sync;

// Re-export main types for convenience
pub use error::{Result, SessionError};
pub use session::{MirrorSession, SessionConfig};

// Re-export commonly used component types
pub use treemirror_capture::{CaptureConfig, TreeMirrorClient};
pub use treemirror_core::{
    ChangeMessage, InitializeMessage, MirrorMessage, MirrorSink, NodeId, NodeRef, NodeType,
    SerializedNode, Tree,
};
pub use treemirror_mirror::{ApplyReport, MirrorConfig, MirrorDelegate, TreeMirror};
pub use treemirror_sync::{verify_convergence, ConvergenceResult, Recorder};
