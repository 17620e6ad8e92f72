//! Intersection source capability and signal plumbing.
//!
//! The registry never talks to the platform's viewport primitive directly:
//! a `SourceProvider` creates one `IntersectionSource` per distinct options
//! triple, and each source pushes raw signals through its `SignalSender`
//! into the registry's queue. Tests substitute a scripted generator.

use std::time::Instant;

use crossbeam_channel::Sender;

use crate::types::{ElementKey, GroupId};

use super::policy::RootMargin;

/// The options triple identifying one underlying source: targets sharing
/// all three share the source.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverOptions {
    /// Minimum visible-area fraction counting as intersecting.
    pub threshold: f64,
    /// Offsets applied to the effective viewport.
    pub root_margin: RootMargin,
    /// Explicit root element; the host viewport when `None`.
    pub root: Option<ElementKey>,
}

/// One raw threshold-crossing notification from a source.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionSignal {
    pub element: ElementKey,
    pub is_intersecting: bool,
    /// Visible-area fraction at the time of the crossing.
    pub ratio: f64,
}

/// Handle given to a source for delivering its signals.
///
/// Sends never block. Signals sent after the registry is gone are silently
/// dropped, matching the forgiving nature of the platform primitive.
#[derive(Debug, Clone)]
pub struct SignalSender {
    group: GroupId,
    tx: Sender<(GroupId, IntersectionSignal)>,
}

impl SignalSender {
    pub(crate) fn new(group: GroupId, tx: Sender<(GroupId, IntersectionSignal)>) -> Self {
        Self { group, tx }
    }

    /// Queue a signal for the registry's next `process_signals` pass.
    pub fn send(&self, signal: IntersectionSignal) {
        let _ = self.tx.send((self.group, signal));
    }

    /// The source group this sender delivers for.
    pub fn group(&self) -> GroupId {
        self.group
    }
}

/// Abstract viewport-intersection primitive.
///
/// Implementations wrap the host's native observer. Dropping the source
/// releases the underlying observer.
pub trait IntersectionSource: Send {
    /// Start delivering signals for `element`.
    fn observe(&mut self, element: &ElementKey);

    /// Stop delivering signals for `element`.
    fn unobserve(&mut self, element: &ElementKey);
}

/// Factory for intersection sources, invoked once per new options triple.
pub trait SourceProvider: Send {
    fn create(
        &mut self,
        options: &ObserverOptions,
        signals: SignalSender,
    ) -> Box<dyn IntersectionSource>;
}

/// Time source for enter timestamps and duration accounting.
pub trait Clock: Send {
    fn now(&self) -> Instant;
}

/// Default clock reading the system monotonic time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
