//! Error types for engine operations.

use thiserror::Error;

/// Errors surfaced synchronously by the engine's public API.
///
/// Failures that happen during execution (handler errors, timeouts, panics)
/// are never returned here; they land on the task record as a terminal
/// [`crate::core::TaskStatus::Failed`] and are read back via status queries.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed submission; the task was never enqueued.
    #[error("invalid submission: {0}")]
    Validation(String),
    /// Pending queue is at its configured depth bound.
    #[error("queue full: {0}")]
    QueueFull(String),
    /// The engine is not running; new submissions are not accepted.
    #[error("engine stopped")]
    Stopped,
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
