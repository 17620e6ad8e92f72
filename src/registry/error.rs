//! Error types for the visibility watch registry.

use thiserror::Error;

/// Errors surfaced synchronously when building the registry or registering
/// a policy. The registry itself performs no I/O and has no failure modes
/// past registration.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Invalid threshold {value}: must be a finite fraction within 0.0..=1.0")]
    InvalidThreshold { value: f64 },

    #[error("Cannot parse root margin '{value}': {reason}")]
    InvalidRootMargin { value: String, reason: String },

    #[error("Invalid policy: {reason}")]
    PolicyInvalid { reason: String },

    #[error("Priority-adaptive policies require a network hint provider")]
    HintProviderRequired,

    #[error("Failed to initialize registry: {reason}")]
    InitFailed { reason: String },
}

/// Failure reported by a side-effect callback.
///
/// Caught and logged at the registry boundary, never propagated into the
/// state machine. Exclusive guards are released unconditionally on failure
/// so later re-entries still trigger.
#[derive(Error, Debug)]
#[error("{reason}")]
pub struct HandlerError {
    reason: String,
}

impl HandlerError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl From<String> for HandlerError {
    fn from(reason: String) -> Self {
        Self::new(reason)
    }
}

impl From<&str> for HandlerError {
    fn from(reason: &str) -> Self {
        Self::new(reason)
    }
}
