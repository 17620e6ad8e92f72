//! Source groups: one intersection source per distinct options triple.

use std::fmt;

use indexmap::IndexMap;

use crate::types::{ElementKey, GroupId, TargetId};

use super::policy::RootMargin;
use super::source::{IntersectionSource, ObserverOptions};

/// Hashable identity of an options triple.
///
/// The threshold is compared bitwise: policies built from the same constant
/// share a group, which is all the deduplication the platform primitive
/// needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct GroupKey {
    threshold_bits: u64,
    root_margin: RootMargin,
    root: Option<ElementKey>,
}

impl GroupKey {
    pub fn new(options: &ObserverOptions) -> Self {
        Self {
            threshold_bits: options.threshold.to_bits(),
            root_margin: options.root_margin,
            root: options.root.clone(),
        }
    }
}

/// Targets sharing one underlying intersection source.
///
/// The source observes each element once, however many registrations the
/// element carries, and unobserves it when the last registration goes away.
pub(crate) struct SourceGroup {
    id: GroupId,
    options: ObserverOptions,
    source: Box<dyn IntersectionSource>,
    members: IndexMap<ElementKey, Vec<TargetId>>,
}

impl SourceGroup {
    pub fn new(id: GroupId, options: ObserverOptions, source: Box<dyn IntersectionSource>) -> Self {
        Self {
            id,
            options,
            source,
            members: IndexMap::new(),
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn threshold(&self) -> f64 {
        self.options.threshold
    }

    /// Add a registration; observes the element on its first registration.
    pub fn add_member(&mut self, element: &ElementKey, target: TargetId) {
        let targets = self.members.entry(element.clone()).or_default();
        if targets.is_empty() {
            self.source.observe(element);
        }
        targets.push(target);
    }

    /// Remove a registration; unobserves the element when none remain.
    pub fn remove_member(&mut self, element: &ElementKey, target: TargetId) {
        let emptied = match self.members.get_mut(element) {
            Some(targets) => {
                targets.retain(|t| *t != target);
                targets.is_empty()
            }
            None => false,
        };

        if emptied {
            self.members.shift_remove(element);
            self.source.unobserve(element);
        }
    }

    /// All registrations for an element, in registration order.
    pub fn targets_for(&self, element: &ElementKey) -> &[TargetId] {
        self.members.get(element).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_count(&self) -> usize {
        self.members.values().map(Vec::len).sum()
    }
}

impl fmt::Debug for SourceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceGroup")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("members", &self.member_count())
            .finish()
    }
}
