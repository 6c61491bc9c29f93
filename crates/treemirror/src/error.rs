//! Error types for the session facade.

use thiserror::Error;
use treemirror_capture::CaptureError;
use treemirror_sync::SyncError;

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The source could not be observed.
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),

    /// Replay or delivery failed.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// The session was started without recording.
    #[error("session is not recording")]
    NotRecording,
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
