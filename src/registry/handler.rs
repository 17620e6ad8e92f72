//! Handler trait: the side-effect seam between the registry and its callers.

use std::time::Duration;

use crate::hints::Urgency;

use super::error::HandlerError;
use super::guard::OperationToken;
use super::target::WatchTarget;

/// Callbacks fired by the registry on visibility transitions.
///
/// Implementations own the side effects (class toggling, content appending,
/// emission to analytics); the registry owns the state transitions. Errors
/// returned here are logged at the registry boundary and never reach the
/// state machine.
pub trait VisibilityHandler: Send + Sync {
    /// Handler name for logging.
    fn name(&self) -> &str;

    /// The target entered the viewport.
    ///
    /// For exclusive policies `pending` carries the token for the triggered
    /// operation; the guard stays busy until the token settles or drops.
    /// For all other policies `pending` is `None`.
    fn on_enter(
        &self,
        target: &WatchTarget,
        pending: Option<OperationToken>,
    ) -> Result<(), HandlerError>;

    /// The target left the viewport.
    ///
    /// `visible_for` is reported for duration-tracking policies and `None`
    /// otherwise.
    fn on_exit(
        &self,
        _target: &WatchTarget,
        _visible_for: Option<Duration>,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Graded load-urgency hint for priority-adaptive policies, emitted
    /// while the target is not intersecting.
    fn on_priority_hint(
        &self,
        _target: &WatchTarget,
        _urgency: Urgency,
    ) -> Result<(), HandlerError> {
        Ok(())
    }
}
