//! Event identifiers.

use std::borrow::Cow;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Identifier of a class of events.
///
/// Identity is the numeric id alone; the name is a label for tooling and is
/// ignored by equality, hashing and dispatch. Raw id `0` is reserved for
/// [`EventId::INVALID`], which can never be registered or dispatched.
///
/// ```
/// use rust_triggers::events::EventId;
///
/// const DOOR_OPENED: EventId = EventId::new(7, "DoorOpened");
///
/// assert_eq!(DOOR_OPENED, EventId::named(7, "renamed"));
/// assert!(DOOR_OPENED.is_valid());
/// assert!(!EventId::INVALID.is_valid());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventId {
    id: u32,
    name: Cow<'static, str>,
}

impl EventId {
    /// Raw value of the sentinel identifier.
    pub const INVALID_RAW: u32 = 0;

    /// The sentinel "no event" identifier.
    pub const INVALID: EventId = EventId::new(Self::INVALID_RAW, "Invalid");

    /// Create an identifier with a static name.
    #[must_use]
    pub const fn new(id: u32, name: &'static str) -> Self {
        Self {
            id,
            name: Cow::Borrowed(name),
        }
    }

    /// Create an identifier with an owned name (e.g. loaded from config).
    pub fn named(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Cow::Owned(name.into()),
        }
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(&self) -> u32 {
        self.id
    }

    /// Display name for tooling.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is anything other than the sentinel.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.id != Self::INVALID_RAW
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl PartialEq for EventId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventId {}

impl Hash for EventId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_equality_ignores_name() {
        let a = EventId::new(3, "Opened");
        let b = EventId::named(3, "Something else");
        assert_eq!(a, b);

        let mut set = FxHashSet::default();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_invalid_sentinel() {
        assert!(!EventId::INVALID.is_valid());
        assert!(!EventId::named(0, "Zero").is_valid());
        assert_eq!(EventId::default(), EventId::INVALID);
    }

    #[test]
    fn test_display() {
        assert_eq!(EventId::new(7, "DoorOpened").to_string(), "DoorOpened(7)");
    }

    #[test]
    fn test_serde_roundtrip() {
        let id = EventId::new(12, "Alarm");
        let json = serde_json::to_string(&id).unwrap();
        let back: EventId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert_eq!(back.name(), "Alarm");
    }
}
