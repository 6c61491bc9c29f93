//! Recording envelope for mirror messages.
//!
//! A [`Recorder`] wraps every message it receives as a [`RecordedEvent`]:
//!
//! ```text
//! { "ty": 5, "ti": 0,   "te": "{\"rootId\":1,\"children\":[...]}" }
//! { "ty": 6, "ti": 180, "te": "{\"adOrMo\":[...]}" }
//! ```
//!
//! `ty` is the event type, `ti` the milliseconds since the recording started
//! and `te` the JSON-encoded message. Events are kept in memory only.

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use treemirror_core::{ChangeMessage, InitializeMessage, MirrorMessage, MirrorSink};
use treemirror_mirror::{MirrorDelegate, TreeMirror};

use crate::error::{Result, SyncError};
use crate::replay::{replay_messages, ReplayReport};

/// Event type of an initialize message.
pub const EVENT_INITIALIZE: u8 = 5;

/// Event type of a change message.
pub const EVENT_MUTATION: u8 = 6;

/// One recorded message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Event type.
    pub ty: u8,
    /// Milliseconds since the recording started.
    pub ti: u64,
    /// JSON-encoded message.
    pub te: String,
}

impl RecordedEvent {
    /// Wrap `message`, stamped at `ti`.
    pub fn encode(message: &MirrorMessage, ti: u64) -> Result<Self> {
        let (ty, te) = match message {
            MirrorMessage::Initialize(init) => (EVENT_INITIALIZE, serde_json::to_string(init)?),
            MirrorMessage::Change(change) => (EVENT_MUTATION, serde_json::to_string(change)?),
        };
        Ok(Self { ty, ti, te })
    }

    /// Unwrap the message carried by this event.
    pub fn decode(&self) -> Result<MirrorMessage> {
        match self.ty {
            EVENT_INITIALIZE => Ok(MirrorMessage::Initialize(serde_json::from_str(&self.te)?)),
            EVENT_MUTATION => Ok(MirrorMessage::Change(serde_json::from_str(&self.te)?)),
            other => Err(SyncError::UnknownEventType(other)),
        }
    }
}

/// [`MirrorSink`] that records every message as a [`RecordedEvent`].
///
/// The clock starts at the initialize message. A change that arrives before
/// any initialize starts the clock itself.
#[derive(Debug, Default)]
pub struct Recorder {
    started: Option<Instant>,
    events: Vec<RecordedEvent>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<RecordedEvent> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All events as a JSON array.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.events)?)
    }

    /// Parse a JSON array of events.
    pub fn events_from_json(json: &str) -> Result<Vec<RecordedEvent>> {
        Ok(serde_json::from_str(json)?)
    }

    fn push(&mut self, message: MirrorMessage, ti: u64) {
        match RecordedEvent::encode(&message, ti) {
            Ok(event) => self.events.push(event),
            Err(error) => tracing::warn!(%error, "failed to record message"),
        }
    }

    fn elapsed_ms(&mut self) -> u64 {
        let started = *self.started.get_or_insert_with(Instant::now);
        u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

impl MirrorSink for Recorder {
    fn initialize(&mut self, message: &InitializeMessage) {
        self.started = Some(Instant::now());
        self.push(MirrorMessage::Initialize(message.clone()), 0);
    }

    fn apply_changed(&mut self, message: &ChangeMessage) {
        let ti = self.elapsed_ms();
        self.push(MirrorMessage::Change(message.clone()), ti);
    }
}

/// Decode `events` and apply them to `mirror` in order.
pub fn replay_events<D: MirrorDelegate>(
    mirror: &mut TreeMirror<D>,
    events: &[RecordedEvent],
) -> Result<ReplayReport> {
    let messages = events
        .iter()
        .map(RecordedEvent::decode)
        .collect::<Result<Vec<_>>>()?;
    replay_messages(mirror, &messages)
}
