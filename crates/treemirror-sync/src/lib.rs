//! # Tree Mirror Sync
//!
//! Moving mirror messages from a capture session to a mirror, and checking
//! that the two ended up identical.
//!
//! ## Overview
//!
//! - [`transport`]: an unbounded tokio channel whose sending half is a
//!   [`MirrorSink`](treemirror_core::MirrorSink), plus an async [`replay`] loop
//! - [`recorder`]: the `{ty, ti, te}` recording envelope and replay of
//!   recorded events
//! - [`convergence`]: BLAKE3 structural digests and a first-difference
//!   comparison of two trees
//!
//! ## Usage
//!
//! ```rust,no_run
//! use treemirror_capture::{CaptureConfig, TreeMirrorClient};
//! use treemirror_core::Tree;
//! use treemirror_mirror::TreeMirror;
//! use treemirror_sync::{channel, replay};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tree = Tree::new();
//!     let root = tree.root();
//!     let (mut sink, mut source) = channel();
//!
//!     let mut client =
//!         TreeMirrorClient::connect(&mut tree, root, CaptureConfig::default(), &mut sink)?;
//!     let body = tree.create_element("BODY")?;
//!     tree.append_child(root, body)?;
//!     client.flush(&mut tree, &mut sink);
//!     drop(sink);
//!
//!     let mut mirror = TreeMirror::default();
//!     let report = replay(&mut source, &mut mirror).await?;
//!     assert!(report.is_clean());
//!     Ok(())
//! }
//! ```
//!
//! ## Message Flow
//!
//! ```text
//! Capture                      Channel                      Mirror
//!   |-- initialize ------------->|                             |
//!   |-- change ----------------->|                             |
//!   |                            |-- initialize -------------->|
//!   |                            |-- change ------------------>|
//!   |-- (sink dropped) --------->|-- closed ------------------>|
//! ```

pub mod convergence;
pub mod error;
pub mod recorder;
pub mod replay;
pub mod transport;

pub use convergence::{
    content_digest, structural_digest, verify_convergence, ConvergenceResult, StructuralDigest,
};
pub use error::{Result, SyncError};
pub use recorder::{replay_events, RecordedEvent, Recorder, EVENT_INITIALIZE, EVENT_MUTATION};
pub use replay::{replay_messages, ReplayReport};
pub use transport::{channel, replay, ChannelSink, ChannelSource, MessageSource};
