//! Error types for the session runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the session runtime.
#[derive(Debug, Error)]
pub enum Error {
    /// Remoting the target failed (the host operation rejected).
    #[error("Failed to make target remote: {0}")]
    Connection(String),

    /// Front construction failed or the underlying client is not ready.
    #[error("Failed to attach front: {0}")]
    Attach(String),

    /// Operation requested in a state that forbids it. A caller bug signal,
    /// never a user-visible failure; state is left unchanged.
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        /// The rejected operation (e.g., "start recording").
        operation: &'static str,
        /// The state the component was in at the time of the call.
        state: String,
    },

    /// The front's start operation failed. State rolled back to idle.
    #[error("Failed to start recording: {0}")]
    Start(#[source] Box<Error>),

    /// The front's stop operation failed. The session is still live.
    #[error("Failed to stop recording: {0}")]
    Stop(#[source] Box<Error>),

    /// Protocol-level error reported by the remote end.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The connection handle was closed while a request was in flight.
    #[error("Channel closed unexpectedly")]
    ChannelClosed,

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns true if this is an invalid-state rejection.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Error::InvalidState { .. })
    }

    /// Returns true if this error should be handled at the panel boundary
    /// (logged, not retried) rather than surfaced to the session caller.
    pub fn is_open_failure(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::Attach(_))
    }

    /// Returns the underlying cause of a start/stop failure, if any.
    pub fn recording_cause(&self) -> Option<&Error> {
        match self {
            Error::Start(cause) | Error::Stop(cause) => Some(cause),
            _ => None,
        }
    }
}
