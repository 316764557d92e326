//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur while replaying or appending to a log.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line could not be decoded into an element.
    #[error("malformed line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    /// An element could not be encoded as a line.
    #[error("encoding error: {0}")]
    Encoding(#[from] reconcile_core::CoreError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
