//! Error types for glasslink.

use thiserror::Error;

/// Main error type for all link operations.
///
/// Every transport-level failure maps to exactly one of three fatal kinds:
/// [`LinkError::TransportClosed`], [`LinkError::Transport`], or
/// [`LinkError::Protocol`]. All three mean the same thing to callers: the
/// connection is dead and the session must be torn down. None of them are
/// fatal to the process while a reconnect loop is running.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The peer closed the stream (EOF mid-frame or between frames).
    #[error("transport closed by peer")]
    TransportClosed,

    /// OS-level I/O failure (reset, broken pipe, closed handle).
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Malformed framing (invalid length, unknown frame type).
    ///
    /// There is no resynchronization mid-stream; the whole session is torn
    /// down and the reconnect loop starts over.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// JSON serialization/deserialization error (control-plane bodies).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Service discovery could not locate a channel on the remote device.
    ///
    /// Surfaced to the operator as a configuration problem; never retried
    /// automatically inside the core.
    #[error("service not found on {0}")]
    ServiceNotFound(String),
}

impl LinkError {
    /// Convert an I/O error, folding EOF into [`LinkError::TransportClosed`].
    ///
    /// `read_exact` reports a stream that ends mid-read as `UnexpectedEof`;
    /// that is a peer close, not an OS failure.
    pub(crate) fn from_io(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            LinkError::TransportClosed
        } else {
            LinkError::Transport(err)
        }
    }
}

/// Result type alias using LinkError.
pub type Result<T> = std::result::Result<T, LinkError>;
