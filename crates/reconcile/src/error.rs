//! Error types for the Reconciler.

use reconcile_core::CoreError;
use reconcile_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Reconciler operations.
///
/// Failed sync attempts are not errors here: `start_sync` and `listen_sync`
/// report them through their boolean result.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Initial data or log could not be loaded.
    #[error("construction failed: {0}")]
    Construction(String),

    /// An element's canonical text is longer than allowed.
    #[error("element of {len} bytes exceeds the {max}-byte limit")]
    SizeExceeded { len: usize, max: usize },

    /// The operation is not supported in this configuration.
    #[error("unimplemented: {0}")]
    Unimplemented(&'static str),

    /// Strategy index out of range.
    #[error("no strategy at index {0}")]
    NoSuchStrategy(usize),

    /// Peer index out of range.
    #[error("no peer at index {0}")]
    NoSuchPeer(usize),

    /// Element log error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Element encoding error.
    #[error("encoding error: {0}")]
    Encoding(#[from] CoreError),
}

/// Result type for Reconciler operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;
