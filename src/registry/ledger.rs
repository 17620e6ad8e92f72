//! Visible-duration accounting for duration-tracking policies.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::types::TargetId;

/// Open visibility intervals: target id -> enter timestamp.
///
/// Entries open on enter and close on exit. A target never has more than
/// one open entry at a time: opening while open is an idempotent no-op and
/// closing while closed yields `None`, so a single visible interval is
/// never double-reported.
#[derive(Debug, Default)]
pub struct DurationLedger {
    entries: HashMap<TargetId, Instant>,
}

impl DurationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an interval at `at`. No-op if one is already open.
    pub fn open(&mut self, id: TargetId, at: Instant) {
        self.entries.entry(id).or_insert(at);
    }

    /// Close the open interval, returning the elapsed duration.
    ///
    /// Returns `None` when no interval is open for the target.
    pub fn close(&mut self, id: TargetId, at: Instant) -> Option<Duration> {
        self.entries
            .remove(&id)
            .map(|start| at.duration_since(start))
    }

    /// Drop any open interval without reporting (target unregistered).
    pub fn discard(&mut self, id: TargetId) {
        self.entries.remove(&id);
    }

    pub fn is_open(&self, id: TargetId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn open_count(&self) -> usize {
        self.entries.len()
    }
}
