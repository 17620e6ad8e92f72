//! Network-condition hints for priority-adaptive policies.
//!
//! The mapping from the reported effective connection type to a load urgency
//! is a configuration table, not inline branching: new connection classes can
//! be added in `[hints]` settings without touching the state machine.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Effective connection classification, mirroring the classes the host
/// platform reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectiveConnection {
    #[serde(rename = "slow-2g")]
    Slow2g,
    #[serde(rename = "2g")]
    Type2g,
    #[serde(rename = "3g")]
    Type3g,
    #[serde(rename = "4g")]
    Type4g,
}

impl fmt::Display for EffectiveConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Slow2g => "slow-2g",
            Self::Type2g => "2g",
            Self::Type3g => "3g",
            Self::Type4g => "4g",
        };
        f.write_str(s)
    }
}

/// Load urgency grade handed to `on_priority_hint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    /// Load immediately.
    LoadNow,
    /// Load when convenient.
    LoadSoon,
    /// Delay loading until the element actually enters the viewport.
    DeferLoad,
}

/// Capability reporting the current effective connection classification.
///
/// Polled synchronously when a hint is about to be emitted; no subscription
/// contract. `None` means the host cannot classify the connection, and no
/// hint is emitted.
pub trait NetworkHintProvider: Send + Sync {
    fn effective_connection(&self) -> Option<EffectiveConnection>;
}

/// Connection classification -> urgency table.
///
/// Classifications absent from the table produce no hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrgencyMap {
    mapping: HashMap<EffectiveConnection, Urgency>,
}

impl Default for UrgencyMap {
    fn default() -> Self {
        let mut mapping = HashMap::new();
        mapping.insert(EffectiveConnection::Type4g, Urgency::LoadNow);
        mapping.insert(EffectiveConnection::Type3g, Urgency::LoadSoon);
        mapping.insert(EffectiveConnection::Type2g, Urgency::DeferLoad);
        mapping.insert(EffectiveConnection::Slow2g, Urgency::DeferLoad);
        Self { mapping }
    }
}

impl UrgencyMap {
    pub fn new(mapping: HashMap<EffectiveConnection, Urgency>) -> Self {
        Self { mapping }
    }

    /// Look up the urgency for a connection classification.
    pub fn urgency_for(&self, connection: EffectiveConnection) -> Option<Urgency> {
        self.mapping.get(&connection).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}
