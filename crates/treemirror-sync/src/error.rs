//! Error types for the sync module.

use thiserror::Error;
use treemirror_core::WireError;
use treemirror_mirror::MirrorError;

/// Errors that can occur while moving messages between a capture session and
/// a mirror.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Every sender of the channel is gone.
    #[error("channel closed")]
    ChannelClosed,

    /// A recorded event carries a type this crate does not know.
    #[error("unknown event type: {0}")]
    UnknownEventType(u8),

    /// A payload could not be encoded or decoded.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// The mirror refused a whole message.
    #[error("mirror error: {0}")]
    Mirror(#[from] MirrorError),
}

impl From<serde_json::Error> for SyncError {
    fn from(error: serde_json::Error) -> Self {
        SyncError::Wire(WireError::Json(error))
    }
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
