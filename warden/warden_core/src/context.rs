//! Evaluation context.
//!
//! A `Context` travels with every authorization decision and every store
//! call made on its behalf. It carries an optional deadline and a shared
//! cancellation flag. Store implementations call [`Context::check`] before
//! doing work so a cancelled request stops at the next I/O boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Deadline and cancellation state for one evaluation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// When the evaluation must be finished.
    deadline: Option<Instant>,

    /// Set once the caller gives up on the evaluation.
    cancelled: Arc<AtomicBool>,
}

impl Context {
    /// Create a context with no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Create a context that expires after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().child_with_timeout(timeout)
    }

    /// Derive a context sharing this one's cancellation flag whose
    /// deadline is the earlier of the parent's and `now + timeout`.
    ///
    /// A timeout too large to represent as an instant adds no deadline.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let deadline = match (self.deadline, Instant::now().checked_add(timeout)) {
            (Some(parent), Some(candidate)) => Some(parent.min(candidate)),
            (parent, candidate) => parent.or(candidate),
        };

        Self {
            deadline,
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// A handle that cancels this context and every context derived from it.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the evaluation has been cancelled or timed out.
    pub fn is_done(&self) -> bool {
        self.check().is_err()
    }

    /// Return `Error::Aborted` if the evaluation was cancelled or its
    /// deadline has passed.
    pub fn check(&self) -> Result<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(Error::Aborted("evaluation cancelled".to_string()));
        }

        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Error::Aborted("deadline exceeded".to_string()));
            }
        }

        Ok(())
    }
}

/// Cancels the context it was taken from.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Cancel the context. Returns `true` if this call performed the cancellation.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::SeqCst)
    }
}
