//! In-process delivery of mirror messages over a tokio channel.
//!
//! The capture side is synchronous, so [`ChannelSink`] sends on an unbounded
//! channel and never blocks. The receiving task drains a [`MessageSource`]
//! and applies each message with [`replay`].

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use treemirror_core::{ChangeMessage, InitializeMessage, MirrorMessage, MirrorSink};
use treemirror_mirror::{MirrorDelegate, TreeMirror};

use crate::error::{Result, SyncError};
use crate::replay::ReplayReport;

/// Receiving end of a message stream.
#[async_trait]
pub trait MessageSource: Send {
    /// Next message, or `None` once the stream has ended.
    async fn recv(&mut self) -> Option<MirrorMessage>;

    /// Receive with timeout.
    ///
    /// Returns `Ok(None)` if the timeout expires first and
    /// [`SyncError::ChannelClosed`] if the stream has ended.
    async fn recv_timeout(&mut self, timeout: Duration) -> Result<Option<MirrorMessage>> {
        match tokio::time::timeout(timeout, self.recv()).await {
            Ok(Some(message)) => Ok(Some(message)),
            Ok(None) => Err(SyncError::ChannelClosed),
            Err(_) => Ok(None),
        }
    }
}

/// Create a connected sink/source pair.
pub fn channel() -> (ChannelSink, ChannelSource) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink { tx, dropped: 0 }, ChannelSource { rx })
}

/// [`MirrorSink`] that forwards every message into a channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<MirrorMessage>,
    dropped: usize,
}

impl ChannelSink {
    /// Whether the receiving side is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Messages that could not be delivered because the receiver was gone.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    fn send(&mut self, message: MirrorMessage) {
        if self.tx.send(message).is_err() {
            self.dropped += 1;
            tracing::warn!(dropped = self.dropped, "mirror channel closed, dropping message");
        }
    }
}

impl MirrorSink for ChannelSink {
    fn initialize(&mut self, message: &InitializeMessage) {
        self.send(MirrorMessage::Initialize(message.clone()));
    }

    fn apply_changed(&mut self, message: &ChangeMessage) {
        self.send(MirrorMessage::Change(message.clone()));
    }
}

/// Receiving half of [`channel`].
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::UnboundedReceiver<MirrorMessage>,
}

impl ChannelSource {
    /// Take a message that is already queued, without waiting.
    pub fn try_recv(&mut self) -> Option<MirrorMessage> {
        self.rx.try_recv().ok()
    }
}

#[async_trait]
impl MessageSource for ChannelSource {
    async fn recv(&mut self) -> Option<MirrorMessage> {
        self.rx.recv().await
    }
}

/// Apply every message from `source` to `mirror` until the stream ends.
pub async fn replay<S, D>(source: &mut S, mirror: &mut TreeMirror<D>) -> Result<ReplayReport>
where
    S: MessageSource + ?Sized,
    D: MirrorDelegate,
{
    let mut report = ReplayReport::default();
    while let Some(message) = source.recv().await {
        report.absorb(mirror.apply(&message)?);
    }
    tracing::debug!(
        messages = report.messages,
        failures = report.failures.len(),
        "replay finished"
    );
    Ok(report)
}
