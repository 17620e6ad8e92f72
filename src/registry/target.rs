//! Watch targets and their visibility state.

use std::sync::Arc;
use std::time::Instant;

use crate::types::{ElementKey, TargetId};

use super::guard::ExclusiveGuard;
use super::policy::WatchPolicy;

/// Visibility state of a watched element.
///
/// The explicit state machine replaces scattered per-caller boolean flags:
/// duplicate signals from the underlying source are absorbed structurally
/// instead of guarded ad hoc at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Registered, no qualifying signal seen yet.
    Unseen,
    /// Intersecting at or above the policy threshold.
    Visible,
    /// Was visible, has since left the viewport.
    Hidden,
}

/// One observed element registration.
#[derive(Debug)]
pub struct WatchTarget {
    id: TargetId,
    element: ElementKey,
    state: WatchState,
    first_visible_at: Option<Instant>,
    policy: Arc<WatchPolicy>,
    guard: Option<ExclusiveGuard>,
}

impl WatchTarget {
    pub(crate) fn new(id: TargetId, element: ElementKey, policy: Arc<WatchPolicy>) -> Self {
        let guard = policy.is_exclusive().then(ExclusiveGuard::new);
        Self {
            id,
            element,
            state: WatchState::Unseen,
            first_visible_at: None,
            policy,
            guard,
        }
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn element(&self) -> &ElementKey {
        &self.element
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// When the current visible interval began.
    ///
    /// `Some` if and only if the target is `Visible`.
    pub fn first_visible_at(&self) -> Option<Instant> {
        self.first_visible_at
    }

    pub fn policy(&self) -> &Arc<WatchPolicy> {
        &self.policy
    }

    pub(crate) fn guard(&self) -> Option<&ExclusiveGuard> {
        self.guard.as_ref()
    }

    /// Unseen/Hidden -> Visible. Sets the enter timestamp.
    pub(crate) fn mark_visible(&mut self, at: Instant) {
        self.state = WatchState::Visible;
        self.first_visible_at = Some(at);
    }

    /// Visible -> Hidden. Clears and returns the enter timestamp.
    pub(crate) fn mark_hidden(&mut self) -> Option<Instant> {
        self.state = WatchState::Hidden;
        self.first_visible_at.take()
    }
}
