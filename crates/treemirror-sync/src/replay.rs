//! Applying a sequence of messages to a mirror.

use treemirror_core::MirrorMessage;
use treemirror_mirror::{ApplyFailure, ApplyReport, MirrorDelegate, TreeMirror};

use crate::error::Result;

/// Aggregate of every [`ApplyReport`] produced during a replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Messages applied.
    pub messages: usize,
    /// Records applied across all messages.
    pub applied: usize,
    pub failures: Vec<ApplyFailure>,
}

impl ReplayReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn absorb(&mut self, report: ApplyReport) {
        self.messages += 1;
        self.applied += report.applied;
        self.failures.extend(report.failures);
    }
}

/// Apply `messages` to `mirror` in order.
///
/// Stops at the first message the mirror refuses outright (a second
/// initialize); record-level failures are collected and replay continues.
pub fn replay_messages<'a, D, I>(mirror: &mut TreeMirror<D>, messages: I) -> Result<ReplayReport>
where
    D: MirrorDelegate,
    I: IntoIterator<Item = &'a MirrorMessage>,
{
    let mut report = ReplayReport::default();
    for message in messages {
        report.absorb(mirror.apply(message)?);
    }
    Ok(report)
}
