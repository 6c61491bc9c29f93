//! The boundary between a capture session and whatever consumes its output.

use crate::wire::{ChangeMessage, InitializeMessage, MirrorMessage};

/// Receiver of a capture session's messages.
///
/// Implemented by the mirror applier itself, by transports that forward
/// messages verbatim, and by recorders. The capture side never emits an empty
/// [`ChangeMessage`].
pub trait MirrorSink {
    /// Seed the receiver with the initial snapshot.
    fn initialize(&mut self, message: &InitializeMessage);

    /// Deliver one non-empty batch.
    fn apply_changed(&mut self, message: &ChangeMessage);
}

/// Collects messages in delivery order.
impl MirrorSink for Vec<MirrorMessage> {
    fn initialize(&mut self, message: &InitializeMessage) {
        self.push(MirrorMessage::Initialize(message.clone()));
    }

    fn apply_changed(&mut self, message: &ChangeMessage) {
        self.push(MirrorMessage::Change(message.clone()));
    }
}

impl<T: MirrorSink + ?Sized> MirrorSink for &mut T {
    fn initialize(&mut self, message: &InitializeMessage) {
        (**self).initialize(message);
    }

    fn apply_changed(&mut self, message: &ChangeMessage) {
        (**self).apply_changed(message);
    }
}
