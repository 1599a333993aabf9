use std::result;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when starting a capture.
///
/// Creating and closing timers never fails. These errors are only surfaced to whoever
/// asked the engine to start capturing.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A capture window is already running and the engine is configured to reject
    /// overlapping captures.
    #[error("a capture is already active ({remaining:?} remaining in the current window)")]
    CaptureAlreadyActive {
        /// How much of the running window is left at the time of the rejected request.
        remaining: Duration,
    },

    /// The requested capture length is not a positive number of milliseconds.
    #[error("invalid capture duration '{value}': {problem}")]
    InvalidDuration {
        /// The value as provided by the caller.
        value: String,

        /// A human-readable description of the problem.
        problem: String,
    },
}

/// A specialized `Result` type for capture operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = result::Result<T, Error>;
