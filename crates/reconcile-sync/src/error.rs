//! Error types for the sync module.

use thiserror::Error;

/// Errors that can occur during a sync attempt.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The peers disagree on the negotiated parameters.
    #[error("protocol mismatch: {0}")]
    ProtocolMismatch(String),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(String),

    /// No frame arrived within the communicant's receive timeout.
    #[error("timeout: {0}")]
    Timeout(String),

    /// A frame could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A control flag other than the expected ones arrived.
    #[error("unexpected flag {got:#04x}")]
    UnexpectedFlag { got: u8 },

    /// The algorithm reached an inconsistent state.
    #[error("strategy error: {0}")]
    Strategy(String),

    /// Encoding or stats error from the core.
    #[error("core error: {0}")]
    Core(#[from] reconcile_core::CoreError),

    /// I/O error from a socket transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
