//! The session: one observed source subtree wired to one in-process mirror.
//!
//! A session owns the capture client, the mirror and an optional recorder.
//! The source tree stays with the caller and is passed to every operation
//! that reads or observes it.

use serde::{Deserialize, Serialize};
use treemirror_capture::{CaptureConfig, TreeMirrorClient};
use treemirror_core::{ChangeMessage, InitializeMessage, MirrorSink, NodeRef, Tree};
use treemirror_mirror::{ApplyReport, MirrorConfig, MirrorDelegate, NoDelegate, TreeMirror};
use treemirror_sync::{
    replay_events, verify_convergence, ConvergenceResult, RecordedEvent, Recorder, ReplayReport,
};

use crate::error::{Result, SessionError};

/// Configuration for a [`MirrorSession`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Capture side settings.
    pub capture: CaptureConfig,
    /// Mirror side settings.
    pub mirror: MirrorConfig,
    /// Keep a [`Recorder`] alongside the mirror.
    pub record: bool,
}

/// Delivers each message to the mirror and, when present, the recorder.
struct FanOut<'a, D: MirrorDelegate> {
    mirror: &'a mut TreeMirror<D>,
    recorder: Option<&'a mut Recorder>,
}

impl<D: MirrorDelegate> MirrorSink for FanOut<'_, D> {
    fn initialize(&mut self, message: &InitializeMessage) {
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.initialize(message);
        }
        <TreeMirror<D> as MirrorSink>::initialize(self.mirror, message);
    }

    fn apply_changed(&mut self, message: &ChangeMessage) {
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.apply_changed(message);
        }
        <TreeMirror<D> as MirrorSink>::apply_changed(self.mirror, message);
    }
}

/// A source subtree mirrored in-process.
///
/// ```rust
/// use treemirror::{MirrorSession, SessionConfig};
/// use treemirror::core::Tree;
///
/// let mut source = Tree::new();
/// let root = source.root();
/// let mut session = MirrorSession::start(&mut source, root, SessionConfig::default()).unwrap();
///
/// let div = source.create_element("DIV").unwrap();
/// source.append_child(root, div).unwrap();
/// session.flush(&mut source);
///
/// assert!(session.verify(&source).is_converged());
/// ```
#[derive(Debug)]
pub struct MirrorSession<D: MirrorDelegate = NoDelegate> {
    client: TreeMirrorClient,
    mirror: TreeMirror<D>,
    recorder: Option<Recorder>,
    config: SessionConfig,
}

impl MirrorSession<NoDelegate> {
    /// Start mirroring the children of `target`.
    pub fn start(source: &mut Tree, target: NodeRef, config: SessionConfig) -> Result<Self> {
        Self::start_with_delegate(source, target, NoDelegate, config)
    }
}

impl<D: MirrorDelegate> MirrorSession<D> {
    /// Start mirroring with a construction delegate on the mirror side.
    pub fn start_with_delegate(
        source: &mut Tree,
        target: NodeRef,
        delegate: D,
        config: SessionConfig,
    ) -> Result<Self> {
        let mut mirror = TreeMirror::with_delegate(delegate, config.mirror.clone());
        let mut recorder = config.record.then(Recorder::new);

        let client = {
            let mut sink = FanOut {
                mirror: &mut mirror,
                recorder: recorder.as_mut(),
            };
            TreeMirrorClient::connect(source, target, config.capture.clone(), &mut sink)?
        };

        let report = mirror.last_report();
        tracing::info!(
            root = %target,
            nodes = mirror.id_count(),
            failures = report.failures.len(),
            recording = config.record,
            "mirror session started"
        );

        Ok(Self {
            client,
            mirror,
            recorder,
            config,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Delivery
    // ─────────────────────────────────────────────────────────────────────────

    /// Deliver the changes made to `source` since the last flush.
    ///
    /// Returns `None` when nothing observable changed or the session is
    /// disconnected. Otherwise returns the mirror's report for the batch.
    pub fn flush(&mut self, source: &mut Tree) -> Option<ApplyReport> {
        let mut sink = FanOut {
            mirror: &mut self.mirror,
            recorder: self.recorder.as_mut(),
        };
        self.client.flush(source, &mut sink)?;
        Some(self.mirror.last_report().clone())
    }

    /// Stop observing `source`. The mirror keeps its current state.
    pub fn disconnect(&mut self, source: &mut Tree) {
        self.client.disconnect(source);
        tracing::info!(nodes = self.mirror.id_count(), "mirror session disconnected");
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inspection
    // ─────────────────────────────────────────────────────────────────────────

    pub fn mirror(&self) -> &TreeMirror<D> {
        &self.mirror
    }

    pub fn client(&self) -> &TreeMirrorClient {
        &self.client
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The most recent batch delivered to the mirror.
    pub fn last_changes(&self) -> Option<&ChangeMessage> {
        self.client.last_changes()
    }

    pub fn recorder(&self) -> Option<&Recorder> {
        self.recorder.as_ref()
    }

    /// Recorded events, empty when the session is not recording.
    pub fn events(&self) -> &[RecordedEvent] {
        self.recorder.as_ref().map(Recorder::events).unwrap_or_default()
    }

    /// Compare the observed subtree of `source` with the mirror.
    pub fn verify(&self, source: &Tree) -> ConvergenceResult {
        verify_convergence(
            source,
            self.client.root(),
            self.mirror.tree(),
            self.mirror.root(),
        )
    }

    /// Rebuild a fresh mirror from the recorded events.
    pub fn replay_recording(&self) -> Result<(TreeMirror, ReplayReport)> {
        let recorder = self.recorder.as_ref().ok_or(SessionError::NotRecording)?;
        let mut mirror = TreeMirror::new(self.config.mirror.clone());
        let report = replay_events(&mut mirror, recorder.events())?;
        Ok((mirror, report))
    }
}
