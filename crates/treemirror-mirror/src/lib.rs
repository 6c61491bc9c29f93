//! # Tree Mirror Mirror
//!
//! The receiving side of Tree Mirror. A [`TreeMirror`] owns its own
//! [`Tree`](treemirror_core::Tree), seeds it from an initialize message and
//! keeps it structurally identical to the source by applying change batches.
//!
//! ## Key Types
//!
//! - [`TreeMirror`] - Identity map plus the six-pass batch applier
//! - [`ApplyReport`] - What applied and what failed, per record
//! - [`MirrorDelegate`] - Host hooks for element construction and attributes
//! - [`SandboxIframes`] - Delegate that keeps mirrored iframes sandboxed
//!
//! ## Failure Model
//!
//! Nothing short of a second initialize aborts a message. A record that names
//! an unknown id, lacks its node type, or cannot be inserted fails alone; the
//! failure is logged with `tracing` and listed in the [`ApplyReport`].

pub mod applier;
pub mod delegate;
pub mod error;

pub use applier::{ApplyFailure, ApplyReport, ApplyStage, MirrorConfig, TreeMirror};
pub use delegate::{Interception, MirrorDelegate, NoDelegate, SandboxIframes};
pub use error::{MirrorError, Result};
