use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(NonZeroU32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(NonZeroU32);

impl TargetId {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn value(&self) -> u32 {
        self.0.get()
    }

    /// Get the inner NonZeroU32
    pub fn as_non_zero(&self) -> NonZeroU32 {
        self.0
    }
}

impl From<NonZeroU32> for TargetId {
    fn from(value: NonZeroU32) -> Self {
        Self(value)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0.get())
    }
}

impl GroupId {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn value(&self) -> u32 {
        self.0.get()
    }

    /// Get the inner NonZeroU32
    pub fn as_non_zero(&self) -> NonZeroU32 {
        self.0
    }
}

impl From<NonZeroU32> for GroupId {
    fn from(value: NonZeroU32) -> Self {
        Self(value)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0.get())
    }
}

/// Interned element identity.
///
/// Callers derive the key from the element's DOM id (or an equivalent stable
/// identity); the engine only ever compares and clones it. Stored once,
/// cloned cheaply.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementKey(Arc<str>);

impl ElementKey {
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ElementKey {
    fn from(key: String) -> Self {
        Self(Arc::from(key))
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_id_creation() {
        assert!(TargetId::new(0).is_none());

        let id = TargetId::new(42).unwrap();
        assert_eq!(id.value(), 42);
    }

    #[test]
    fn test_group_id_creation() {
        assert!(GroupId::new(0).is_none());

        let id = GroupId::new(7).unwrap();
        assert_eq!(id.value(), 7);
    }

    #[test]
    fn test_id_equality_and_hash() {
        let id1 = TargetId::new(42).unwrap();
        let id2 = TargetId::new(42).unwrap();
        let id3 = TargetId::new(43).unwrap();

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);

        // Usable as map keys
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(id1);
        assert!(set.contains(&id2));
        assert!(!set.contains(&id3));
    }

    #[test]
    fn test_element_key_interning() {
        let a = ElementKey::new("sentinel");
        let b = a.clone();

        assert_eq!(a, b);
        assert_eq!(a.as_str(), "sentinel");
        assert_eq!(a.to_string(), "sentinel");
    }

    #[test]
    fn test_element_key_from_string() {
        let a: ElementKey = "page-bottom".into();
        let b: ElementKey = String::from("page-bottom").into();
        assert_eq!(a, b);
    }
}
