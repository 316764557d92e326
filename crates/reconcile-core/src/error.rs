//! Error types for the reconcile core.

use thiserror::Error;

use crate::stats::StatId;

/// Core errors that can occur while encoding elements or recording stats.
#[derive(Debug, Error)]
pub enum CoreError {
    /// `timer_end` was called for a category with no running timer.
    #[error("timer for {0:?} is not running")]
    TimerNotRunning(StatId),

    /// A byte counter was used as a timer.
    #[error("{0:?} is not a time category")]
    NotATimer(StatId),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("decoding error: {0}")]
    Decoding(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
