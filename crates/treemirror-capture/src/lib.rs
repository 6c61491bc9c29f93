//! # Tree Mirror Capture
//!
//! The capture side of Tree Mirror. Watches a subtree of a host
//! [`Tree`](treemirror_core::Tree) and turns it into an initial snapshot plus
//! a stream of change batches that a mirror can replay.
//!
//! ## Overview
//!
//! A [`TreeMirrorClient`] owns one [`TreeSerializer`], which in turn owns the
//! session's [`IdentityRegistry`]. On connect the client snapshots the target
//! and starts observing it. On every flush it drains the tree's pending
//! mutation records, buckets them with [`summarize`], encodes the summary with
//! [`encode`] and hands the resulting message to a
//! [`MirrorSink`](treemirror_core::MirrorSink).
//!
//! ## Key Types
//!
//! - [`TreeMirrorClient`] - Snapshot, flush and disconnect
//! - [`TreeSerializer`] - Node to wire record, full once then by reference
//! - [`IdentityRegistry`] - `NodeRef -> NodeId` side table
//! - [`ChangeSummary`] - One batch of raw records, bucketed
//!
//! ## Usage
//!
//! ```rust,no_run
//! use treemirror_capture::{CaptureConfig, TreeMirrorClient};
//! use treemirror_core::{MirrorMessage, Tree};
//!
//! let mut tree = Tree::new();
//! let root = tree.root();
//! let mut sink: Vec<MirrorMessage> = Vec::new();
//!
//! let mut client =
//!     TreeMirrorClient::connect(&mut tree, root, CaptureConfig::default(), &mut sink)?;
//!
//! let body = tree.create_element("BODY")?;
//! tree.append_child(root, body)?;
//! client.flush(&mut tree, &mut sink);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Design Notes
//!
//! - **Identity by handle**: ids are keyed by arena handle, never by content
//! - **Full once**: a node's subtree is sent in full the first time only
//! - **Anchored runs**: placements carry one previous-sibling anchor each
//! - **No empty batches**: a flush with nothing visible calls no sink

pub mod client;
pub mod encoder;
pub mod error;
pub mod registry;
pub mod serializer;
pub mod summary;

pub use client::TreeMirrorClient;
pub use encoder::encode;
pub use error::{CaptureError, Result};
pub use registry::IdentityRegistry;
pub use serializer::{CaptureConfig, TreeSerializer};
pub use summary::{summarize, ChangeSummary};
