//! Exclusive-operation guard for asynchronous side effects.
//!
//! A policy with `exclusive` set treats its `on_enter` as starting a pending
//! operation. While the operation is outstanding, further qualifying enter
//! transitions for the same target suppress the dispatch. The guard clears
//! when the issued token settles, on success or failure alike, so a failed
//! load never wedges the watcher.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Tracks one outstanding operation per exclusive target.
#[derive(Debug, Default)]
pub(crate) struct ExclusiveGuard {
    in_flight: Arc<AtomicBool>,
}

impl ExclusiveGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an operation issued earlier is still outstanding.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Mark the guard busy and hand out the settling token.
    pub fn issue(&self) -> OperationToken {
        self.in_flight.store(true, Ordering::Release);
        OperationToken {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    /// Release regardless of outstanding tokens (handler returned an error).
    pub fn force_release(&self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

/// Completion token for an exclusive operation.
///
/// Move it into the asynchronous work triggered by `on_enter` and settle it
/// when that work finishes. Dropping the token settles it too, so an early
/// return, a failed load or an unwind all release the guard.
#[derive(Debug)]
pub struct OperationToken {
    in_flight: Arc<AtomicBool>,
}

impl OperationToken {
    /// Mark the operation complete. Equivalent to dropping the token.
    pub fn settle(self) {}
}

impl Drop for OperationToken {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}
