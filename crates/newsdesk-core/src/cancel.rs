//! Cancellation token for mounted query observers.
//!
//! A `CancellationToken` is tied to the lifetime of whatever consumes a query
//! result. Once cancelled, a pending result is dropped instead of delivered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cancellation token shared between a consumer and the task serving it.
///
/// Cloning is cheap; cancelling any clone is observed by all of them.
///
/// # Example
///
/// ```
/// use newsdesk_core::cancel::CancellationToken;
///
/// let token = CancellationToken::new();
/// let task_side = token.clone();
///
/// token.cancel();
/// assert!(task_side.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Return `Err(CancelledError)` once cancellation was requested.
    pub fn check(&self) -> Result<(), CancelledError> {
        if self.is_cancelled() {
            Err(CancelledError)
        } else {
            Ok(())
        }
    }
}

/// Error returned when the consumer of an operation went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelledError;

impl std::fmt::Display for CancelledError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Operation was cancelled")
    }
}

impl std::error::Error for CancelledError {}
