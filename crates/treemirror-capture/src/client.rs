//! Capture client: snapshot, batch delivery and disconnect.

use treemirror_core::{ChangeMessage, MirrorSink, NodeRef, Tree};

use crate::encoder::encode;
use crate::error::{CaptureError, Result};
use crate::serializer::{CaptureConfig, TreeSerializer};
use crate::summary::summarize;

/// Watches one subtree of a host [`Tree`] and feeds a [`MirrorSink`].
///
/// The client does not hold on to the tree. Every call that needs it takes it
/// explicitly, so the host stays free to mutate between flushes.
#[derive(Debug)]
pub struct TreeMirrorClient {
    serializer: TreeSerializer,
    connected: bool,
    last_changes: Option<ChangeMessage>,
}

impl TreeMirrorClient {
    /// Snapshot `target`, deliver the snapshot to `sink`, and start observing.
    pub fn connect<S: MirrorSink + ?Sized>(
        tree: &mut Tree,
        target: NodeRef,
        config: CaptureConfig,
        sink: &mut S,
    ) -> Result<Self> {
        if let Some(observed) = tree.observed() {
            return Err(CaptureError::AlreadyObserved(observed));
        }
        let kind = tree
            .kind(target)
            .ok_or(treemirror_core::TreeError::UnknownNode(target))?;
        if !kind.is_container() {
            return Err(CaptureError::NotAContainer(target));
        }

        let mut serializer = TreeSerializer::new(target, config);
        let snapshot = serializer.snapshot(tree);
        tree.observe(target)?;
        sink.initialize(&snapshot);

        tracing::debug!(
            root = %target,
            nodes = serializer.registry().len(),
            "capture client connected"
        );

        Ok(Self {
            serializer,
            connected: true,
            last_changes: None,
        })
    }

    /// Deliver everything that changed since the last flush.
    ///
    /// Returns the message handed to `sink`, or `None` when nothing
    /// observable changed (the sink is not called in that case).
    pub fn flush<S: MirrorSink + ?Sized>(
        &mut self,
        tree: &mut Tree,
        sink: &mut S,
    ) -> Option<&ChangeMessage> {
        if !self.connected {
            return None;
        }

        let records = tree.take_records();
        let summary = summarize(&records);
        if summary.is_empty() {
            return None;
        }

        let message = encode(&mut self.serializer, tree, &summary);
        if message.is_empty() {
            tracing::debug!(
                records = records.len(),
                "suppressing batch with no visible changes"
            );
            return None;
        }

        tracing::trace!(
            records = records.len(),
            sent = message.record_count(),
            "delivering batch"
        );
        sink.apply_changed(&message);
        self.last_changes = Some(message);
        self.last_changes.as_ref()
    }

    /// Stop observing. Pending, unflushed records are dropped.
    pub fn disconnect(&mut self, tree: &mut Tree) {
        if !self.connected {
            return;
        }
        if tree.observed() == Some(self.serializer.root()) {
            tree.disconnect_observer();
        }
        self.connected = false;
        tracing::debug!(root = %self.serializer.root(), "capture client disconnected");
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// The observed root.
    pub fn root(&self) -> NodeRef {
        self.serializer.root()
    }

    /// The most recent message delivered to a sink.
    pub fn last_changes(&self) -> Option<&ChangeMessage> {
        self.last_changes.as_ref()
    }

    pub fn serializer(&self) -> &TreeSerializer {
        &self.serializer
    }
}
